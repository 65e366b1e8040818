use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::models::{FolderSize, WorkspaceInfo};

/// 已知的工作区大小
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSize {
    /// 单根文件夹总大小
    Total(u64),

    /// 多根工作区逐个文件夹的大小
    Folders(Vec<FolderSize>),
}

impl WorkspaceSize {
    pub fn total(&self) -> u64 {
        match self {
            WorkspaceSize::Total(size) => *size,
            WorkspaceSize::Folders(sizes) => sizes.iter().map(|s| s.size).sum(),
        }
    }
}

/// 界面会话状态：最近一次解析的条目列表、已知大小和勾选状态
///
/// 每次刷新都整体替换列表，旧的大小和勾选随之清空。
#[derive(Debug, Clone)]
pub struct Session {
    /// workspaceStorage 根目录
    storage_root: PathBuf,

    /// 当前显示的条目，已排序
    workspaces: Vec<WorkspaceInfo>,

    /// 缓存目录大小
    storage_sizes: HashMap<String, u64>,

    /// 工作区大小
    workspace_sizes: HashMap<String, WorkspaceSize>,

    /// 正在计算缓存大小的条目
    pending_storage: HashSet<String>,

    /// 正在计算工作区大小的条目
    pending_workspace: HashSet<String>,

    /// 已勾选的条目名称
    selected: HashSet<String>,
}

impl Session {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            workspaces: Vec::new(),
            storage_sizes: HashMap::new(),
            workspace_sizes: HashMap::new(),
            pending_storage: HashSet::new(),
            pending_workspace: HashSet::new(),
            selected: HashSet::new(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn workspaces(&self) -> &[WorkspaceInfo] {
        &self.workspaces
    }

    pub fn get(&self, index: usize) -> Option<&WorkspaceInfo> {
        self.workspaces.get(index)
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    /// 用新的解析结果整体替换
    pub fn replace_workspaces(&mut self, workspaces: Vec<WorkspaceInfo>) {
        self.workspaces = workspaces;
        self.storage_sizes.clear();
        self.workspace_sizes.clear();
        self.pending_storage.clear();
        self.pending_workspace.clear();
        self.selected.clear();
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// 切换单个条目的勾选状态
    pub fn toggle(&mut self, name: &str) {
        if !self.selected.remove(name) {
            self.selected.insert(name.to_string());
        }
    }

    /// 全部已勾选时清空，否则全选
    pub fn toggle_all(&mut self) {
        if self.selected.len() == self.workspaces.len() {
            self.selected.clear();
        } else {
            self.selected = self.workspaces.iter().map(|w| w.name.clone()).collect();
        }
    }

    /// 追加勾选满足条件的条目
    pub fn select_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&WorkspaceInfo) -> bool,
    {
        let before = self.selected.len();
        for info in self.workspaces.iter().filter(|w| predicate(w)) {
            self.selected.insert(info.name.clone());
        }
        self.selected.len() - before
    }

    /// 反选
    pub fn invert_selection(&mut self) {
        self.selected = self
            .workspaces
            .iter()
            .filter(|w| !self.selected.contains(&w.name))
            .map(|w| w.name.clone())
            .collect();
    }

    /// 已勾选的条目名称，按显示顺序
    pub fn selected_names(&self) -> Vec<String> {
        self.workspaces
            .iter()
            .filter(|w| self.selected.contains(&w.name))
            .map(|w| w.name.clone())
            .collect()
    }

    pub fn mark_storage_pending(&mut self, name: &str) {
        self.pending_storage.insert(name.to_string());
    }

    pub fn mark_workspace_pending(&mut self, name: &str) {
        self.pending_workspace.insert(name.to_string());
    }

    pub fn is_storage_pending(&self, name: &str) -> bool {
        self.pending_storage.contains(name)
    }

    pub fn is_workspace_pending(&self, name: &str) -> bool {
        self.pending_workspace.contains(name)
    }

    /// 记录缓存大小，忽略已经不在列表中的条目
    pub fn set_storage_size(&mut self, name: &str, size: u64) {
        self.pending_storage.remove(name);
        if self.contains(name) {
            self.storage_sizes.insert(name.to_string(), size);
        }
    }

    /// 记录工作区大小，忽略已经不在列表中的条目
    pub fn set_workspace_size(&mut self, name: &str, size: WorkspaceSize) {
        self.pending_workspace.remove(name);
        if self.contains(name) {
            self.workspace_sizes.insert(name.to_string(), size);
        }
    }

    pub fn storage_size(&self, name: &str) -> Option<u64> {
        self.storage_sizes.get(name).copied()
    }

    pub fn workspace_size(&self, name: &str) -> Option<&WorkspaceSize> {
        self.workspace_sizes.get(name)
    }

    /// 已知缓存大小的合计
    pub fn known_storage_total(&self) -> u64 {
        self.storage_sizes.values().sum()
    }

    fn contains(&self, name: &str) -> bool {
        self.workspaces.iter().any(|w| w.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FolderInfo, WorkspaceTarget};

    fn folder(name: &str, exists: bool) -> WorkspaceInfo {
        WorkspaceInfo {
            name: name.to_string(),
            target: WorkspaceTarget::Folder {
                folder: FolderInfo { path: PathBuf::from(format!("/p/{}", name)), exists },
            },
        }
    }

    fn session() -> Session {
        let mut session = Session::new("/storage");
        session.replace_workspaces(vec![
            WorkspaceInfo::error("broken", "oops"),
            folder("gone", false),
            folder("here", true),
        ]);
        session
    }

    #[test]
    fn test_select_where_and_invert() {
        let mut session = session();

        assert_eq!(session.select_where(WorkspaceInfo::is_missing), 1);
        assert_eq!(session.select_where(WorkspaceInfo::is_broken), 1);
        assert_eq!(session.selected_names(), vec!["broken", "gone"]);

        session.invert_selection();
        assert_eq!(session.selected_names(), vec!["here"]);
    }

    #[test]
    fn test_toggle_all() {
        let mut session = session();

        session.toggle_all();
        assert_eq!(session.selected_count(), 3);

        session.toggle_all();
        assert_eq!(session.selected_count(), 0);
    }

    #[test]
    fn test_refresh_clears_sizes_and_selection() {
        let mut session = session();
        session.toggle("here");
        session.set_storage_size("here", 100);
        session.set_workspace_size("here", WorkspaceSize::Total(5));

        session.replace_workspaces(vec![folder("here", true)]);

        assert_eq!(session.selected_count(), 0);
        assert_eq!(session.storage_size("here"), None);
        assert_eq!(session.workspace_size("here"), None);
    }

    #[test]
    fn test_sizes_for_unknown_names_are_dropped() {
        let mut session = session();
        session.mark_storage_pending("deleted");

        session.set_storage_size("deleted", 10);
        session.set_storage_size("here", 32);
        session.set_storage_size("gone", 10);

        assert!(!session.is_storage_pending("deleted"));
        assert_eq!(session.storage_size("deleted"), None);
        assert_eq!(session.known_storage_total(), 42);
    }
}
