use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// 远程工作区类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteWorkspaceType {
    /// Dev Container
    DevContainer,

    /// GitHub 仓库（vscode-vfs）
    Github,

    /// GitHub Codespaces
    GithubCodespaces,

    /// SSH 远程主机
    Ssh,

    /// WSL 发行版
    Wsl,
}

/// 单个本地文件夹及其是否存在
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderInfo {
    /// 解析后的绝对路径
    pub path: PathBuf,

    /// 路径在磁盘上是否存在
    pub exists: bool,
}

/// 多根工作区文件中声明的一个成员文件夹
///
/// 无法解析的成员不会让整个工作区变成错误，而是以 `{ error }` 的形式保留在列表中。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum WorkspaceFolderEntry {
    /// 本地文件夹
    Folder(FolderInfo),

    /// 无法解析的成员
    Error { error: String },
}

/// 多根工作区文件（.code-workspace）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceFileInfo {
    /// 工作区文件路径
    pub path: PathBuf,

    /// 工作区文件是否存在
    pub exists: bool,

    /// 成员文件夹，保持声明顺序
    pub folders: Vec<WorkspaceFolderEntry>,
}

/// 远程工作区，不检查存在性
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteWorkspaceInfo {
    /// 远程环境类型
    #[serde(rename = "type")]
    pub kind: RemoteWorkspaceType,

    /// 原始 authority（包含 `+` 之后的部分）
    pub authority: String,

    /// 远程路径
    pub path: String,
}

/// 缓存条目指向的目标，每个变体只携带自己的数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkspaceTarget {
    /// 单根文件夹
    Folder { folder: FolderInfo },

    /// 多根工作区文件
    Workspace { workspace: WorkspaceFileInfo },

    /// 远程工作区
    Remote { remote: RemoteWorkspaceInfo },

    /// 无法解析的条目
    Error { error: String },
}

/// 一个 workspaceStorage 缓存条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceInfo {
    /// 缓存目录名，同时也是删除时使用的键
    pub name: String,

    #[serde(flatten)]
    pub target: WorkspaceTarget,
}

impl RemoteWorkspaceType {
    /// 所有远程类型，按排序优先级排列
    pub const ALL: [RemoteWorkspaceType; 5] = [
        RemoteWorkspaceType::DevContainer,
        RemoteWorkspaceType::Github,
        RemoteWorkspaceType::GithubCodespaces,
        RemoteWorkspaceType::Ssh,
        RemoteWorkspaceType::Wsl,
    ];

    /// 获取远程类型的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteWorkspaceType::DevContainer => "dev-container",
            RemoteWorkspaceType::Github => "github",
            RemoteWorkspaceType::GithubCodespaces => "github-codespaces",
            RemoteWorkspaceType::Ssh => "ssh",
            RemoteWorkspaceType::Wsl => "wsl",
        }
    }

    /// 获取远程类型的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            RemoteWorkspaceType::DevContainer => "Dev Container",
            RemoteWorkspaceType::Github => "GitHub",
            RemoteWorkspaceType::GithubCodespaces => "Codespaces",
            RemoteWorkspaceType::Ssh => "SSH",
            RemoteWorkspaceType::Wsl => "WSL",
        }
    }
}

impl WorkspaceFolderEntry {
    /// 获取成员文件夹的本地路径（仅当可以解析时）
    pub fn folder(&self) -> Option<&FolderInfo> {
        match self {
            WorkspaceFolderEntry::Folder(folder) => Some(folder),
            WorkspaceFolderEntry::Error { .. } => None,
        }
    }
}

impl WorkspaceInfo {
    /// 创建错误条目
    pub fn error(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: WorkspaceTarget::Error { error: error.into() },
        }
    }

    /// 获取类型的字符串表示
    pub fn type_name(&self) -> &'static str {
        match &self.target {
            WorkspaceTarget::Folder { .. } => "folder",
            WorkspaceTarget::Workspace { .. } => "workspace",
            WorkspaceTarget::Remote { .. } => "remote",
            WorkspaceTarget::Error { .. } => "error",
        }
    }

    /// 获取类型的显示名称
    pub fn type_display_name(&self) -> &'static str {
        match &self.target {
            WorkspaceTarget::Folder { .. } => "文件夹",
            WorkspaceTarget::Workspace { .. } => "工作区",
            WorkspaceTarget::Remote { remote } => remote.kind.display_name(),
            WorkspaceTarget::Error { .. } => "损坏",
        }
    }

    /// 获取类型的优先级（用于排序）
    ///
    /// error < folder < workspace < 各远程类型（按 [`RemoteWorkspaceType::ALL`] 的顺序）
    pub fn priority(&self) -> u8 {
        match &self.target {
            WorkspaceTarget::Error { .. } => 0,
            WorkspaceTarget::Folder { .. } => 1,
            WorkspaceTarget::Workspace { .. } => 2,
            WorkspaceTarget::Remote { remote } => match remote.kind {
                RemoteWorkspaceType::DevContainer => 3,
                RemoteWorkspaceType::Github => 4,
                RemoteWorkspaceType::GithubCodespaces => 5,
                RemoteWorkspaceType::Ssh => 6,
                RemoteWorkspaceType::Wsl => 7,
            },
        }
    }

    /// 获取最具体的路径类字符串：错误信息、文件夹路径、工作区文件路径或远程路径
    pub fn display_path(&self) -> Cow<'_, str> {
        match &self.target {
            WorkspaceTarget::Error { error } => Cow::Borrowed(error.as_str()),
            WorkspaceTarget::Folder { folder } => folder.path.to_string_lossy(),
            WorkspaceTarget::Workspace { workspace } => workspace.path.to_string_lossy(),
            WorkspaceTarget::Remote { remote } => Cow::Borrowed(remote.path.as_str()),
        }
    }

    /// 排序键：类型优先级 + 路径类字符串
    pub fn sort_key(&self) -> (u8, Cow<'_, str>) {
        (self.priority(), self.display_path())
    }

    /// 本地目标路径（文件夹或工作区文件）
    pub fn local_path(&self) -> Option<&Path> {
        match &self.target {
            WorkspaceTarget::Folder { folder } => Some(&folder.path),
            WorkspaceTarget::Workspace { workspace } => Some(&workspace.path),
            _ => None,
        }
    }

    /// 本地目标是否已经不存在
    pub fn is_missing(&self) -> bool {
        match &self.target {
            WorkspaceTarget::Folder { folder } => !folder.exists,
            WorkspaceTarget::Workspace { workspace } => !workspace.exists,
            _ => false,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.target, WorkspaceTarget::Remote { .. })
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.target, WorkspaceTarget::Error { .. })
    }
}

/// 缓存条目的全序比较：先按排序键逐字节比较，键相同时再比较名称
pub fn compare_workspace_info(a: &WorkspaceInfo, b: &WorkspaceInfo) -> Ordering {
    let (a_priority, a_path) = a.sort_key();
    let (b_priority, b_path) = b.sort_key();

    a_priority
        .cmp(&b_priority)
        .then_with(|| a_path.as_bytes().cmp(b_path.as_bytes()))
        .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
}
