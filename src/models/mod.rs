pub mod size_result;
pub mod workspace;

pub use size_result::{size_failure_summary, FolderSize, SizeResult};
pub use workspace::{
    compare_workspace_info, FolderInfo, RemoteWorkspaceInfo, RemoteWorkspaceType,
    WorkspaceFileInfo, WorkspaceFolderEntry, WorkspaceInfo, WorkspaceTarget,
};
