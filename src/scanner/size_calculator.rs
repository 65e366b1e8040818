use anyhow::{Context, Result};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::{FolderSize, SizeResult, WorkspaceFolderEntry, WorkspaceInfo, WorkspaceTarget};

/// 大小计算器 - 计算缓存目录和工作区文件夹占用的磁盘空间
#[derive(Debug, Clone)]
pub struct SizeCalculator {
    /// 单个目录内同时进行的文件 stat 数量上限
    max_concurrent_stats: usize,
}

/// 一次目录大小计算的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeReport {
    /// 累计大小（目录读取失败时为 0）
    pub size: u64,

    /// 计算过程中遇到的错误
    pub failures: Vec<String>,
}

/// 一个目录的直接内容
#[derive(Debug, Default)]
struct DirectoryListing {
    files: Vec<PathBuf>,
    directories: Vec<PathBuf>,

    /// 无法获取类型而被跳过的目录项
    failures: Vec<String>,
}

impl SizeCalculator {
    /// 创建新的大小计算器
    pub fn new() -> Self {
        Self::with_concurrency(crate::config::DefaultConfig::default_max_concurrent_stats())
    }

    /// 使用自定义并发上限创建计算器
    pub fn with_concurrency(max_concurrent_stats: usize) -> Self {
        Self {
            max_concurrent_stats: max_concurrent_stats.max(1),
        }
    }

    /// 计算目录大小
    pub async fn directory_size(&self, root: &Path) -> u64 {
        self.directory_size_report(root).await.size
    }

    /// 计算目录大小，并返回过程中遇到的错误
    ///
    /// 使用显式栈逐个目录遍历，不跟随符号链接。
    /// 读取某个目录失败时整个结果记为 0；单个文件 stat 失败只跳过该文件。
    pub async fn directory_size_report(&self, root: &Path) -> SizeReport {
        self.walk(root, list_directory, file_size).await
    }

    async fn walk<L, LF, S, SF>(&self, root: &Path, list: L, stat: S) -> SizeReport
    where
        L: Fn(PathBuf) -> LF,
        LF: Future<Output = Result<DirectoryListing>>,
        S: Fn(PathBuf) -> SF,
        SF: Future<Output = io::Result<u64>>,
    {
        let mut report = SizeReport::default();
        let mut stack = vec![root.to_path_buf()];

        while let Some(current) = stack.pop() {
            let listing = match list(current.clone()).await {
                Ok(listing) => listing,
                Err(e) => {
                    let message = format!("读取 '{}' 时出错 ({:#})", current.display(), e);
                    tracing::warn!("{}", message);
                    report.failures.push(message);
                    report.size = 0;
                    return report;
                }
            };

            report.failures.extend(listing.failures);
            stack.extend(listing.directories);

            let stats: Vec<(PathBuf, io::Result<u64>)> = stream::iter(listing.files)
                .map(|path| {
                    let size = stat(path.clone());
                    async move { (path, size.await) }
                })
                .buffer_unordered(self.max_concurrent_stats)
                .collect()
                .await;

            for (path, size) in stats {
                match size {
                    Ok(size) => report.size += size,
                    Err(e) => {
                        let message =
                            format!("获取文件 '{}' 的大小时出错 ({})", path.display(), e);
                        tracing::warn!("{}", message);
                        report.failures.push(message);
                    }
                }
            }
        }

        report
    }

    /// 计算缓存条目目录大小
    pub async fn entry_size(&self, entry_path: &Path) -> SizeReport {
        self.directory_size_report(entry_path).await
    }

    /// 计算文件夹大小，调用方需要先确认路径存在
    pub async fn folder_size(&self, path: &Path) -> SizeReport {
        self.directory_size_report(path).await
    }

    /// 并发计算多根工作区中存在的成员文件夹大小，不存在或无法解析的成员被跳过
    ///
    /// 返回逐个文件夹的大小和所有文件夹遍历中遇到的错误。
    pub async fn workspace_folder_sizes(
        &self,
        folders: &[WorkspaceFolderEntry],
    ) -> (Vec<FolderSize>, Vec<String>) {
        let existing = folders
            .iter()
            .filter_map(WorkspaceFolderEntry::folder)
            .filter(|folder| folder.exists);

        let reports = join_all(existing.map(|folder| async move {
            (folder.path.clone(), self.folder_size(&folder.path).await)
        }))
        .await;

        let mut sizes = Vec::with_capacity(reports.len());
        let mut failures = Vec::new();
        for (path, report) in reports {
            failures.extend(report.failures);
            sizes.push(FolderSize {
                path,
                size: report.size,
            });
        }

        (sizes, failures)
    }

    /// 计算缓存条目本身占用的大小
    pub async fn storage_size(&self, storage_root: &Path, info: &WorkspaceInfo) -> SizeResult {
        let report = self.entry_size(&storage_root.join(&info.name)).await;

        SizeResult::Total {
            name: info.name.clone(),
            size: report.size,
            failures: report.failures,
        }
    }

    /// 计算条目指向的工作区大小
    ///
    /// 文件夹条目返回总大小（文件夹不存在时返回 `None`），多根工作区返回逐个文件夹的大小，
    /// 远程和错误条目没有本地路径，返回 `None`。
    pub async fn workspace_size(&self, info: &WorkspaceInfo) -> Option<SizeResult> {
        match &info.target {
            WorkspaceTarget::Folder { folder } if folder.exists => {
                let report = self.folder_size(&folder.path).await;
                Some(SizeResult::Total {
                    name: info.name.clone(),
                    size: report.size,
                    failures: report.failures,
                })
            }
            WorkspaceTarget::Workspace { workspace } => {
                let (entries, failures) = self.workspace_folder_sizes(&workspace.folders).await;
                Some(SizeResult::Breakdown {
                    name: info.name.clone(),
                    entries,
                    failures,
                })
            }
            _ => None,
        }
    }
}

impl Default for SizeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// 列出目录的直接内容，按 lstat 类型区分文件和子目录
///
/// 无法获取类型的条目记为失败并跳过，读取目录本身失败则返回错误。
async fn list_directory(dir: PathBuf) -> Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();

    let mut entries = fs::read_dir(&dir).await.context("无法打开目录")?;

    while let Some(entry) = entries.next_entry().await.context("无法读取目录项")? {
        let path = entry.path();

        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => listing.files.push(path),
            Ok(file_type) if file_type.is_dir() => listing.directories.push(path),
            Ok(_) => {}
            Err(e) => {
                let message = format!("获取 '{}' 的类型时出错 ({})", path.display(), e);
                tracing::warn!("{}", message);
                listing.failures.push(message);
            }
        }
    }

    Ok(listing)
}

async fn file_size(path: PathBuf) -> io::Result<u64> {
    Ok(fs::metadata(&path).await?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FolderInfo;
    use anyhow::anyhow;
    use std::fs as std_fs;
    use tempfile::tempdir;

    fn create_sized_tree(root: &Path) {
        std_fs::write(root.join("ten.bin"), vec![0u8; 10]).unwrap();
        std_fs::write(root.join("twenty.bin"), vec![0u8; 20]).unwrap();

        let sub = root.join("sub");
        std_fs::create_dir(&sub).unwrap();
        std_fs::write(sub.join("five.bin"), vec![0u8; 5]).unwrap();
    }

    fn listing(files: &[&str], directories: &[&str]) -> DirectoryListing {
        DirectoryListing {
            files: files.iter().map(PathBuf::from).collect(),
            directories: directories.iter().map(PathBuf::from).collect(),
            failures: Vec::new(),
        }
    }

    /// 固定的目录树: /r 下有 a、b 和子目录 sub，sub 下有 c，locked 无法读取
    async fn fake_list(dir: PathBuf) -> Result<DirectoryListing> {
        match dir.to_str() {
            Some("/r") => Ok(listing(&["/r/a", "/r/b"], &["/r/sub"])),
            Some("/r/sub") => Ok(listing(&["/r/sub/c"], &[])),
            Some("/r/locked") => Err(anyhow!("权限不足")),
            Some("/with-locked") => Ok(listing(&["/with-locked/a"], &["/r/locked"])),
            _ => Err(anyhow!("没有这个目录")),
        }
    }

    async fn fake_stat(path: PathBuf) -> io::Result<u64> {
        match path.to_str() {
            Some("/r/a") => Ok(10),
            Some("/r/b") => Err(io::Error::new(io::ErrorKind::PermissionDenied, "拒绝访问")),
            Some("/r/sub/c") => Ok(5),
            _ => Ok(20),
        }
    }

    #[tokio::test]
    async fn test_calculate_empty_directory() {
        let calculator = SizeCalculator::new();
        let temp_dir = tempdir().unwrap();

        let report = calculator.directory_size_report(temp_dir.path()).await;

        assert_eq!(report, SizeReport::default());
    }

    #[tokio::test]
    async fn test_sums_nested_files() {
        let calculator = SizeCalculator::new();
        let temp_dir = tempdir().unwrap();
        create_sized_tree(temp_dir.path());

        assert_eq!(calculator.folder_size(temp_dir.path()).await.size, 35);
    }

    #[tokio::test]
    async fn test_concurrency_limit_does_not_change_result() {
        let temp_dir = tempdir().unwrap();
        for i in 0..20 {
            std_fs::write(temp_dir.path().join(format!("{}.bin", i)), vec![0u8; 3]).unwrap();
        }

        let calculator = SizeCalculator::with_concurrency(1);

        assert_eq!(calculator.directory_size(temp_dir.path()).await, 60);
    }

    #[tokio::test]
    async fn test_deep_nesting() {
        let temp_dir = tempdir().unwrap();
        let mut dir = temp_dir.path().to_path_buf();
        for _ in 0..64 {
            dir = dir.join("d");
        }
        std_fs::create_dir_all(&dir).unwrap();
        std_fs::write(dir.join("leaf"), vec![0u8; 7]).unwrap();

        assert_eq!(SizeCalculator::new().directory_size(temp_dir.path()).await, 7);
    }

    #[tokio::test]
    async fn test_missing_root_reports_zero() {
        let temp_dir = tempdir().unwrap();

        let report = SizeCalculator::new()
            .directory_size_report(&temp_dir.path().join("missing"))
            .await;

        assert_eq!(report.size, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("missing"));
    }

    #[tokio::test]
    async fn test_root_that_is_a_file_reports_zero() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("plain.bin");
        std_fs::write(&file, vec![0u8; 64]).unwrap();

        let report = SizeCalculator::new().directory_size_report(&file).await;

        assert_eq!(report.size, 0);
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_unstatable_file_is_skipped() {
        let report = SizeCalculator::new()
            .walk(Path::new("/r"), fake_list, fake_stat)
            .await;

        assert_eq!(report.size, 15);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("/r/b"));
    }

    #[tokio::test]
    async fn test_unreadable_subdirectory_aborts() {
        let report = SizeCalculator::with_concurrency(1)
            .walk(Path::new("/with-locked"), fake_list, fake_stat)
            .await;

        assert_eq!(report.size, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("/r/locked"));
        assert!(report.failures[0].contains("权限不足"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_not_followed() {
        let temp_dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        std_fs::write(outside.path().join("big.bin"), vec![0u8; 1000]).unwrap();
        std_fs::write(temp_dir.path().join("own.bin"), vec![0u8; 4]).unwrap();

        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("link-dir")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("cycle")).unwrap();

        assert_eq!(SizeCalculator::new().directory_size(temp_dir.path()).await, 4);
    }

    #[tokio::test]
    async fn test_vanished_entry_reports_failure() {
        let storage = tempdir().unwrap();

        let result = SizeCalculator::new()
            .storage_size(storage.path(), &WorkspaceInfo::error("vanished", "x"))
            .await;

        assert_eq!(result.total(), 0);
        assert_eq!(result.failures().len(), 1);
        assert!(result.failures()[0].contains("vanished"));
    }

    #[tokio::test]
    async fn test_workspace_folder_sizes_skip_missing() {
        let temp_dir = tempdir().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        std_fs::create_dir(&a).unwrap();
        std_fs::create_dir(&b).unwrap();
        std_fs::write(a.join("f"), vec![0u8; 8]).unwrap();
        std_fs::write(b.join("f"), vec![0u8; 16]).unwrap();

        let folders = vec![
            WorkspaceFolderEntry::Folder(FolderInfo {
                path: a.clone(),
                exists: true,
            }),
            WorkspaceFolderEntry::Folder(FolderInfo {
                path: temp_dir.path().join("gone"),
                exists: false,
            }),
            WorkspaceFolderEntry::Error { error: "no path".to_string() },
            WorkspaceFolderEntry::Folder(FolderInfo {
                path: b.clone(),
                exists: true,
            }),
        ];

        let (sizes, failures) = SizeCalculator::new().workspace_folder_sizes(&folders).await;

        assert_eq!(
            sizes,
            vec![
                FolderSize { path: a, size: 8 },
                FolderSize { path: b, size: 16 },
            ]
        );
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_workspace_size_by_type() {
        let temp_dir = tempdir().unwrap();
        create_sized_tree(temp_dir.path());
        let calculator = SizeCalculator::new();

        let folder = WorkspaceInfo {
            name: "f".to_string(),
            target: WorkspaceTarget::Folder {
                folder: FolderInfo {
                    path: temp_dir.path().to_path_buf(),
                    exists: true,
                },
            },
        };
        assert_eq!(
            calculator.workspace_size(&folder).await,
            Some(SizeResult::Total {
                name: "f".to_string(),
                size: 35,
                failures: Vec::new(),
            })
        );

        let missing = WorkspaceInfo {
            name: "m".to_string(),
            target: WorkspaceTarget::Folder {
                folder: FolderInfo {
                    path: temp_dir.path().join("gone"),
                    exists: false,
                },
            },
        };
        assert_eq!(calculator.workspace_size(&missing).await, None);

        assert_eq!(calculator.workspace_size(&WorkspaceInfo::error("e", "x")).await, None);
    }
}
