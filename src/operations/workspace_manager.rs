use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, SizeUnit};
use crate::models::{
    size_failure_summary, SizeResult, WorkspaceFolderEntry, WorkspaceInfo, WorkspaceTarget,
};
use crate::operations::cleanup::{CleanupOperation, CleanupReport, DeleteMode};
use crate::scanner::{resolve_workspaces, SizeCalculator};
use crate::utils::format_size_with_unit;

/// 按类别选择缓存条目
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// 目标已不存在
    pub missing: bool,

    /// 远程工作区
    pub remote: bool,

    /// 无法解析
    pub broken: bool,
}

impl Selection {
    /// 条目是否属于所选类别之一
    pub fn matches(&self, info: &WorkspaceInfo) -> bool {
        (self.missing && info.is_missing())
            || (self.remote && info.is_remote())
            || (self.broken && info.is_broken())
    }
}

/// JSON 输出中的一行
#[derive(Serialize)]
struct ListedWorkspace<'a> {
    #[serde(flatten)]
    info: &'a WorkspaceInfo,

    #[serde(skip_serializing_if = "Option::is_none")]
    storage_size: Option<u64>,
}

/// 命令行模式下的工作区管理
pub struct WorkspaceManager {
    /// workspaceStorage 根目录
    storage_root: PathBuf,

    /// 大小计算器
    calculator: SizeCalculator,

    /// 删除方式
    delete_mode: DeleteMode,

    /// 大小显示单位
    size_unit: SizeUnit,
}

impl WorkspaceManager {
    /// 根据配置创建，`root_override` 优先于配置中的目录
    pub fn from_config(config: &Config, root_override: Option<PathBuf>) -> Result<Self> {
        let storage_root = match root_override {
            Some(root) => root,
            None => config.storage_root()?,
        };

        Ok(Self {
            storage_root,
            calculator: SizeCalculator::with_concurrency(config.size.max_concurrent_stats),
            delete_mode: if config.delete.use_trash {
                DeleteMode::Trash
            } else {
                DeleteMode::Permanent
            },
            size_unit: config.display.size_unit,
        })
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// 列出所有缓存条目
    pub async fn list(&self, json: bool, with_sizes: bool) -> Result<()> {
        let workspaces = resolve_workspaces(&self.storage_root).await?;

        let sizes = if with_sizes {
            self.storage_sizes(&workspaces).await?
        } else {
            HashMap::new()
        };

        if json {
            let rows: Vec<ListedWorkspace> = workspaces
                .iter()
                .map(|info| ListedWorkspace {
                    info,
                    storage_size: sizes.get(&info.name).copied(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        for info in &workspaces {
            let size = sizes
                .get(&info.name)
                .map(|size| format_size_with_unit(*size, self.size_unit))
                .unwrap_or_default();
            let marker = if info.is_missing() { " ❌" } else { "" };

            println!(
                "{:<34} {:<14} {:>12}  {}{}",
                info.name,
                info.type_display_name(),
                size,
                info.display_path(),
                marker
            );
        }

        println!("共 {} 个条目: {}", workspaces.len(), self.storage_root.display());

        Ok(())
    }

    /// 计算指定条目（或全部条目）的缓存大小与工作区大小
    pub async fn sizes(&self, names: &[String], all: bool) -> Result<()> {
        let workspaces = resolve_workspaces(&self.storage_root).await?;

        let targets: Vec<&WorkspaceInfo> = if all {
            workspaces.iter().collect()
        } else {
            let mut targets = Vec::new();
            for name in names {
                match workspaces.iter().find(|w| &w.name == name) {
                    Some(info) => targets.push(info),
                    None => bail!("找不到缓存条目 {}", name),
                }
            }
            targets
        };

        let mut results = Vec::new();

        for info in targets {
            let storage = self.calculator.storage_size(&self.storage_root, info).await;
            println!(
                "{}  缓存: {}",
                storage.name(),
                format_size_with_unit(storage.total(), self.size_unit)
            );
            results.push(storage);

            let workspace = self.calculator.workspace_size(info).await;
            match &workspace {
                Some(SizeResult::Total { size, .. }) => {
                    println!("    工作区: {}", format_size_with_unit(*size, self.size_unit));
                }
                Some(SizeResult::Breakdown { entries, .. }) => {
                    for entry in entries {
                        println!(
                            "    {}: {}",
                            entry.path.display(),
                            format_size_with_unit(entry.size, self.size_unit)
                        );
                    }
                }
                None => {}
            }
            results.extend(workspace);
        }

        report_size_failures(&results);

        Ok(())
    }

    /// 删除指定名称和所选类别的条目
    pub async fn delete(
        &self,
        names: &[String],
        selection: Selection,
        force: bool,
    ) -> Result<CleanupReport> {
        let workspaces = resolve_workspaces(&self.storage_root).await?;
        let targets = select_names(&workspaces, names, selection);

        if targets.is_empty() {
            println!("没有需要删除的条目");
            return Ok(CleanupReport::default());
        }

        if !force {
            println!("将删除以下 {} 个缓存条目:", targets.len());
            for name in &targets {
                if let Some(info) = workspaces.iter().find(|w| &w.name == name) {
                    println!("  {}  {}", name, info.display_path());
                } else {
                    println!("  {}", name);
                }
            }
            print!("\n继续? [y/N] ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if input.trim().to_lowercase() != "y" {
                println!("操作已取消");
                return Ok(CleanupReport::default());
            }
        }

        let report = CleanupOperation::new(&self.storage_root, self.delete_mode)
            .delete_entries(&targets)
            .await;

        println!("已删除 {} 个条目", report.deleted.len());

        Ok(report)
    }

    /// 计算所有条目的缓存大小，显示进度条
    async fn storage_sizes(&self, workspaces: &[WorkspaceInfo]) -> Result<HashMap<String, u64>> {
        let progress = ProgressBar::new(workspaces.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );

        let mut results = Vec::with_capacity(workspaces.len());
        for info in workspaces {
            progress.set_message(info.name.clone());
            results.push(self.calculator.storage_size(&self.storage_root, info).await);
            progress.inc(1);
        }
        progress.finish_and_clear();

        report_size_failures(&results);

        Ok(results
            .iter()
            .map(|result| (result.name().to_string(), result.total()))
            .collect())
    }
}

/// 在标准错误输出上打印合并后的大小计算错误
fn report_size_failures(results: &[SizeResult]) {
    if let Some(summary) = size_failure_summary(results) {
        eprintln!("以下条目计算大小时出错，显示的大小可能偏小:\n{}", summary);
    }
}

/// 合并显式名称和按类别选择的条目，保持列表顺序并去重
pub fn select_names(
    workspaces: &[WorkspaceInfo],
    names: &[String],
    selection: Selection,
) -> Vec<String> {
    let mut selected: Vec<String> = workspaces
        .iter()
        .filter(|info| names.contains(&info.name) || selection.matches(info))
        .map(|info| info.name.clone())
        .collect();

    // 显式指定但不在列表中的名称也交给删除操作，由它报告失败
    for name in names {
        if !selected.contains(name) {
            selected.push(name.clone());
        }
    }

    selected
}

/// 统计多根工作区中无法解析的成员数量
pub fn broken_member_count(info: &WorkspaceInfo) -> usize {
    match &info.target {
        WorkspaceTarget::Workspace { workspace } => workspace
            .folders
            .iter()
            .filter(|f| matches!(f, WorkspaceFolderEntry::Error { .. }))
            .count(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FolderInfo, RemoteWorkspaceInfo, RemoteWorkspaceType, WorkspaceFileInfo};

    fn sample() -> Vec<WorkspaceInfo> {
        vec![
            WorkspaceInfo::error("broken", "no workspace.json"),
            WorkspaceInfo {
                name: "missing".to_string(),
                target: WorkspaceTarget::Folder {
                    folder: FolderInfo {
                        path: PathBuf::from("/gone"),
                        exists: false,
                    },
                },
            },
            WorkspaceInfo {
                name: "present".to_string(),
                target: WorkspaceTarget::Folder {
                    folder: FolderInfo {
                        path: PathBuf::from("/here"),
                        exists: true,
                    },
                },
            },
            WorkspaceInfo {
                name: "multi".to_string(),
                target: WorkspaceTarget::Workspace {
                    workspace: WorkspaceFileInfo {
                        path: PathBuf::from("/w.code-workspace"),
                        exists: true,
                        folders: vec![WorkspaceFolderEntry::Error { error: "x".to_string() }],
                    },
                },
            },
            WorkspaceInfo {
                name: "remote".to_string(),
                target: WorkspaceTarget::Remote {
                    remote: RemoteWorkspaceInfo {
                        kind: RemoteWorkspaceType::Ssh,
                        authority: "ssh-remote+box".to_string(),
                        path: "/srv".to_string(),
                    },
                },
            },
        ]
    }

    #[test]
    fn test_select_by_category() {
        let workspaces = sample();

        let selection = Selection {
            missing: true,
            broken: true,
            ..Selection::default()
        };

        assert_eq!(select_names(&workspaces, &[], selection), vec!["broken", "missing"]);
    }

    #[test]
    fn test_select_merges_explicit_names() {
        let workspaces = sample();
        let names = vec!["present".to_string(), "unknown".to_string(), "remote".to_string()];

        let selection = Selection { remote: true, ..Selection::default() };

        assert_eq!(
            select_names(&workspaces, &names, selection),
            vec!["present", "remote", "unknown"]
        );
    }

    #[test]
    fn test_broken_member_count() {
        let workspaces = sample();

        assert_eq!(broken_member_count(&workspaces[3]), 1);
        assert_eq!(broken_member_count(&workspaces[2]), 0);
    }
}
