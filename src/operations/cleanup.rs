use anyhow::{anyhow, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// 删除方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// 直接递归删除
    Permanent,

    /// 移动到回收站
    Trash,
}

/// 批量删除结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// 成功删除的条目
    pub deleted: Vec<String>,

    /// 失败信息，每个失败条目一条
    pub failures: Vec<String>,
}

impl CleanupReport {
    /// 所有失败信息合并为一条消息，没有失败时返回 `None`
    pub fn failure_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(self.failures.join("\n"))
        }
    }
}

/// 清理操作 - 删除 workspaceStorage 中的缓存条目
#[derive(Debug, Clone)]
pub struct CleanupOperation {
    /// workspaceStorage 根目录
    storage_root: PathBuf,

    /// 删除方式
    mode: DeleteMode,
}

impl CleanupOperation {
    pub fn new(storage_root: impl Into<PathBuf>, mode: DeleteMode) -> Self {
        Self {
            storage_root: storage_root.into(),
            mode,
        }
    }

    /// 逐个删除缓存条目，一个失败不影响其他条目
    pub async fn delete_entries(&self, names: &[String]) -> CleanupReport {
        let mut report = CleanupReport::default();

        for name in names {
            match self.delete_entry(name).await {
                Ok(()) => {
                    tracing::info!("已删除缓存条目 {}", name);
                    report.deleted.push(name.clone());
                }
                Err(e) => {
                    let message = format!("删除 {} 失败: {:#}", name, e);
                    tracing::warn!("{}", message);
                    report.failures.push(message);
                }
            }
        }

        report
    }

    async fn delete_entry(&self, name: &str) -> Result<()> {
        if !is_plain_entry_name(name) {
            return Err(anyhow!("非法的条目名称"));
        }

        let entry_path = self.storage_root.join(name);

        match self.mode {
            DeleteMode::Permanent => fs::remove_dir_all(&entry_path).await?,
            DeleteMode::Trash => {
                if !fs::try_exists(&entry_path).await? {
                    return Err(anyhow!("{} 不存在", entry_path.display()));
                }
                // 使用 trash crate 安全删除到回收站
                tokio::task::spawn_blocking(move || trash::delete(&entry_path))
                    .await?
                    .map_err(|e| anyhow!("无法移动到回收站: {}", e))?;
            }
        }

        Ok(())
    }
}

/// 条目名称必须是单个普通路径分量，防止删除到根目录之外
fn is_plain_entry_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    #[test]
    fn test_entry_name_validation() {
        assert!(is_plain_entry_name("0a1b2c3d"));
        assert!(!is_plain_entry_name(""));
        assert!(!is_plain_entry_name(".."));
        assert!(!is_plain_entry_name("a/b"));
        assert!(!is_plain_entry_name("/etc"));
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let root = tempdir().unwrap();
        for name in ["one", "three"] {
            let dir = root.path().join(name);
            std_fs::create_dir(&dir).unwrap();
            std_fs::write(dir.join("state.vscdb"), "data").unwrap();
        }

        let operation = CleanupOperation::new(root.path(), DeleteMode::Permanent);
        let names = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let report = operation.delete_entries(&names).await;

        assert_eq!(report.deleted, vec!["one".to_string(), "three".to_string()]);
        assert_eq!(report.failures.len(), 1);
        let summary = report.failure_summary().unwrap();
        assert!(summary.contains("two"));
        assert!(!summary.contains("one"));
        assert!(!root.path().join("one").exists());
        assert!(!root.path().join("three").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let root = tempdir().unwrap();
        let storage = root.path().join("storage");
        std_fs::create_dir(&storage).unwrap();

        let operation = CleanupOperation::new(&storage, DeleteMode::Permanent);
        let report = operation.delete_entries(&["..".to_string()]).await;

        assert!(report.deleted.is_empty());
        assert!(storage.exists());
    }
}
