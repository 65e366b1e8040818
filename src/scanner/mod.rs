pub mod remote_authority;
pub mod size_calculator;
pub mod uri;
pub mod workspace_parser;
pub mod workspace_resolver;

pub use remote_authority::classify_remote;
pub use size_calculator::{SizeCalculator, SizeReport};
pub use uri::ResourceUri;
pub use workspace_parser::{WorkspaceParser, WORKSPACE_METADATA_FILE};
pub use workspace_resolver::resolve_workspaces;
