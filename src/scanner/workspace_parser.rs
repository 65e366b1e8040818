use anyhow::{anyhow, bail, Context, Result};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::{
    FolderInfo, RemoteWorkspaceInfo, WorkspaceFileInfo, WorkspaceFolderEntry, WorkspaceInfo,
    WorkspaceTarget,
};
use crate::scanner::remote_authority::classify_remote;
use crate::scanner::uri::{resolve_path, ResourceUri};

/// 每个缓存条目目录下的元数据文件名
pub const WORKSPACE_METADATA_FILE: &str = "workspace.json";

/// 工作区解析器 - 读取单个缓存条目的 workspace.json 并判断它指向什么
///
/// 解析过程中的任何错误都会被转换成 [`WorkspaceTarget::Error`]，
/// 每个缓存条目总是恰好产生一个 [`WorkspaceInfo`]。
#[derive(Debug, Clone)]
pub struct WorkspaceParser {
    /// workspaceStorage 根目录
    storage_root: PathBuf,
}

impl WorkspaceParser {
    /// 创建新的解析器
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// 解析一个缓存条目
    pub async fn parse_entry(&self, name: &str) -> WorkspaceInfo {
        let entry_path = self.storage_root.join(name);

        match self.resolve_target(&entry_path).await {
            Ok(target) => WorkspaceInfo {
                name: name.to_string(),
                target,
            },
            Err(e) => {
                tracing::debug!("解析缓存条目 {} 失败: {:#}", name, e);
                WorkspaceInfo::error(
                    name,
                    format!(
                        "处理 {} 中的目录 {} 时出错: {:#}",
                        self.storage_root.display(),
                        name,
                        e
                    ),
                )
            }
        }
    }

    /// 判断条目指向的目标
    async fn resolve_target(&self, entry_path: &Path) -> Result<WorkspaceTarget> {
        let metadata_path = entry_path.join(WORKSPACE_METADATA_FILE);

        if !fs::try_exists(&metadata_path).await.unwrap_or(false) {
            return Ok(error_target(format!(
                "{} 下没有 {}",
                entry_path.display(),
                WORKSPACE_METADATA_FILE
            )));
        }

        let content = fs::read_to_string(&metadata_path)
            .await
            .with_context(|| format!("无法读取 {}", metadata_path.display()))?;

        let storage = match parse_object(&content) {
            Ok(storage) => storage,
            Err(e) => {
                return Ok(error_target(format!(
                    "无法解析 {} ({:#})",
                    metadata_path.display(),
                    e
                )))
            }
        };

        if let Some(reference) = storage.get("workspace") {
            let Some(reference) = reference.as_str() else {
                return Ok(error_target(format!(
                    "{} 中的 workspace 不是字符串",
                    metadata_path.display()
                )));
            };
            return self.resolve_workspace_file(reference, &metadata_path).await;
        }

        if let Some(reference) = storage.get("folder") {
            let Some(reference) = reference.as_str() else {
                return Ok(error_target(format!(
                    "{} 中的 folder 不是字符串",
                    metadata_path.display()
                )));
            };
            return resolve_folder(reference, &metadata_path).await;
        }

        Ok(error_target(format!(
            "{} 中没有工作区文件夹或工作区文件引用",
            metadata_path.display()
        )))
    }

    /// 解析多根工作区文件引用
    async fn resolve_workspace_file(
        &self,
        reference: &str,
        metadata_path: &Path,
    ) -> Result<WorkspaceTarget> {
        let file_path = match ResourceUri::parse(reference)? {
            ResourceUri::File(path) => resolve_path(&path, &std::env::current_dir()?),
            uri @ ResourceUri::Other { .. } => {
                return Ok(error_target(format!(
                    "工作区文件 URI 的 scheme ({}) 不是 file，位于 {}",
                    uri.scheme(),
                    metadata_path.display()
                )))
            }
        };

        // 工作区文件读取失败（包括已被删除）由调用方转换为 error 变体
        let folders = read_workspace_folders(&file_path).await?;

        Ok(WorkspaceTarget::Workspace {
            workspace: WorkspaceFileInfo {
                path: file_path,
                exists: true,
                folders,
            },
        })
    }
}

/// 解析单根文件夹引用，非本地 scheme 交给远程类型判断
async fn resolve_folder(reference: &str, metadata_path: &Path) -> Result<WorkspaceTarget> {
    match ResourceUri::parse(reference)? {
        ResourceUri::File(path) => {
            let path = resolve_path(&path, &std::env::current_dir()?);
            let exists = fs::try_exists(&path).await.unwrap_or(false);
            Ok(WorkspaceTarget::Folder {
                folder: FolderInfo { path, exists },
            })
        }
        ResourceUri::Other {
            scheme,
            authority,
            path,
        } => match classify_remote(&scheme, &authority) {
            Some(kind) => Ok(WorkspaceTarget::Remote {
                remote: RemoteWorkspaceInfo {
                    kind,
                    authority,
                    path,
                },
            }),
            None => Ok(error_target(format!(
                "无法识别工作区 URI 的 scheme ({}) 或 authority ({})，位于 {}",
                scheme,
                authority,
                metadata_path.display()
            ))),
        },
    }
}

/// 读取 .code-workspace 文件中的成员文件夹
async fn read_workspace_folders(file_path: &Path) -> Result<Vec<WorkspaceFolderEntry>> {
    let content = fs::read_to_string(file_path)
        .await
        .with_context(|| format!("无法读取工作区文件 {}", file_path.display()))?;

    let workspace_file = parse_object(&content)
        .with_context(|| format!("无法解析工作区文件 {}", file_path.display()))?;

    let declared = match workspace_file.get("folders") {
        None => bail!("工作区文件 {} 中没有 folders", file_path.display()),
        Some(Value::Array(folders)) => folders,
        Some(_) => bail!("工作区文件 {} 中的 folders 不是数组", file_path.display()),
    };

    // 相对路径基于工作区文件所在目录
    let base_dir = file_path.parent().unwrap_or(Path::new("/")).to_path_buf();

    let folders = declared
        .iter()
        .map(|folder| resolve_member_folder(folder, &base_dir));

    Ok(join_all(folders).await)
}

/// 解析单个成员文件夹，失败时产生内联的错误项
async fn resolve_member_folder(folder: &Value, base_dir: &Path) -> WorkspaceFolderEntry {
    let path = if let Some(path) = folder.get("path").and_then(Value::as_str) {
        PathBuf::from(path)
    } else if let Some(uri) = folder.get("uri").and_then(Value::as_str) {
        match ResourceUri::parse(uri) {
            Ok(ResourceUri::File(path)) => path,
            Ok(ResourceUri::Other { .. }) => {
                return WorkspaceFolderEntry::Error {
                    error: format!("没有 path，且 uri 不是本地文件: {}", uri),
                }
            }
            Err(e) => {
                return WorkspaceFolderEntry::Error {
                    error: format!("{:#}", e),
                }
            }
        }
    } else {
        return WorkspaceFolderEntry::Error {
            error: "文件夹既没有 path 也没有 uri".to_string(),
        };
    };

    let path = resolve_path(&path, base_dir);
    let exists = fs::try_exists(&path).await.unwrap_or(false);

    WorkspaceFolderEntry::Folder(FolderInfo { path, exists })
}

/// 宽松解析 JSON 对象（允许注释和尾随逗号）
fn parse_object(content: &str) -> Result<Map<String, Value>> {
    match json5::from_str::<Value>(content)? {
        Value::Object(object) => Ok(object),
        other => Err(anyhow!("期望 JSON 对象，实际为 {}", json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "布尔值",
        Value::Number(_) => "数字",
        Value::String(_) => "字符串",
        Value::Array(_) => "数组",
        Value::Object(_) => "对象",
    }
}

fn error_target(error: String) -> WorkspaceTarget {
    WorkspaceTarget::Error { error }
}
