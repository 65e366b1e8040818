pub mod config;
pub mod models;
pub mod scanner;
pub mod utils;
pub mod tui;
pub mod operations;

// 重新导出常用模块
pub use models::{compare_workspace_info, SizeResult, WorkspaceInfo, WorkspaceTarget};
pub use operations::{CleanupOperation, CleanupReport, DeleteMode};
pub use scanner::{resolve_workspaces, SizeCalculator, WorkspaceParser};
