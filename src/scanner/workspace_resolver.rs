use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::Path;
use tokio::fs;

use crate::models::{compare_workspace_info, WorkspaceInfo};
use crate::scanner::workspace_parser::WorkspaceParser;

/// 枚举 workspaceStorage 根目录下的所有缓存条目并解析
///
/// 根目录不存在或无法读取时返回错误；单个条目的问题只会体现在该条目的 error 变体中。
/// 返回的列表已经按 [`compare_workspace_info`] 排序。
pub async fn resolve_workspaces(storage_root: &Path) -> Result<Vec<WorkspaceInfo>> {
    tracing::info!("开始解析 workspaceStorage: {}", storage_root.display());

    let mut entries = fs::read_dir(storage_root)
        .await
        .with_context(|| format!("无法读取 workspaceStorage 目录 {}", storage_root.display()))?;

    let mut names = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("无法读取 workspaceStorage 目录 {}", storage_root.display()))?
    {
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("无法获取 {} 的类型: {}", entry.path().display(), e);
            }
        }
    }

    let parser = WorkspaceParser::new(storage_root);
    let mut workspaces = join_all(names.iter().map(|name| parser.parse_entry(name))).await;

    workspaces.sort_by(compare_workspace_info);

    tracing::info!("共解析 {} 个缓存条目", workspaces.len());

    Ok(workspaces)
}
