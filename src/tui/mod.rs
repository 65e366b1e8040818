pub mod app;
pub mod events;
pub mod screens;
pub mod session;

pub use app::App;
pub use events::{Event, EventHandler};
pub use session::{Session, WorkspaceSize};
