use anyhow::{anyhow, Context, Result};
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// workspace.json 中引用的资源：本地路径或其他 scheme 的 URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// `file` scheme 或者不带 scheme 的普通路径（可能是相对路径）
    File(PathBuf),

    /// 其他 scheme，authority 和 path 已解码
    Other {
        scheme: String,
        authority: String,
        path: String,
    },
}

impl ResourceUri {
    /// 解析引用字符串
    ///
    /// 只有长度至少为 2 的 scheme 才视为 URI，这样 `C:\foo` 这样的 Windows 路径仍被当作普通路径。
    pub fn parse(value: &str) -> Result<Self> {
        if !has_scheme(value) {
            return Ok(ResourceUri::File(PathBuf::from(value)));
        }

        let url = Url::parse(value).with_context(|| format!("无效的 URI: {}", value))?;

        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| anyhow!("无法将 URI 转换为本地路径: {}", value))?;
            return Ok(ResourceUri::File(path));
        }

        Ok(ResourceUri::Other {
            scheme: url.scheme().to_string(),
            authority: decode(url.authority()),
            path: decode(url.path()),
        })
    }

    pub fn scheme(&self) -> &str {
        match self {
            ResourceUri::File(_) => "file",
            ResourceUri::Other { scheme, .. } => scheme,
        }
    }
}

/// 把可能是相对的路径解析为基于 `base` 的绝对路径，并做词法规范化
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// 词法规范化：去掉 `.`，折叠 `..`，不访问文件系统
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }

    normalized
}

fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    scheme.len() >= 2
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_parse_file_uri() {
        let uri = ResourceUri::parse("file:///tmp/my%20project").unwrap();
        assert_eq!(uri, ResourceUri::File(PathBuf::from("/tmp/my project")));
    }

    #[test]
    fn test_parse_plain_path() {
        let uri = ResourceUri::parse("relative/dir").unwrap();
        assert_eq!(uri, ResourceUri::File(PathBuf::from("relative/dir")));
        assert_eq!(uri.scheme(), "file");
    }

    #[test]
    fn test_windows_drive_is_not_a_scheme() {
        let uri = ResourceUri::parse("C:\\Users\\me\\project").unwrap();
        assert!(matches!(uri, ResourceUri::File(_)));
    }

    #[test]
    fn test_parse_remote_uri_decodes_authority() {
        let uri = ResourceUri::parse("vscode-remote://wsl%2BUbuntu/home/me").unwrap();
        assert_eq!(
            uri,
            ResourceUri::Other {
                scheme: "vscode-remote".to_string(),
                authority: "wsl+Ubuntu".to_string(),
                path: "/home/me".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_remote_uri_keeps_plus() {
        let uri = ResourceUri::parse("vscode-remote://wsl+Ubuntu/home/me").unwrap();
        match uri {
            ResourceUri::Other { authority, path, .. } => {
                assert_eq!(authority, "wsl+Ubuntu");
                assert_eq!(path, "/home/me");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_relative_path() {
        let resolved = resolve_path(Path::new("../b/./c"), Path::new("/work/a"));
        assert_eq!(resolved, PathBuf::from("/work/b/c"));

        let absolute = resolve_path(Path::new("/x/y"), Path::new("/ignored"));
        assert_eq!(absolute, PathBuf::from("/x/y"));
    }
}
