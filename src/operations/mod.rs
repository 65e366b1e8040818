pub mod cleanup;
pub mod workspace_manager;

pub use cleanup::{CleanupOperation, CleanupReport, DeleteMode};
pub use workspace_manager::{select_names, Selection, WorkspaceManager};
