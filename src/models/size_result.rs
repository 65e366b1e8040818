use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 单个成员文件夹的大小
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderSize {
    /// 文件夹路径
    pub path: PathBuf,

    /// 文件夹大小（字节）
    pub size: u64,
}

/// 一次大小计算的结果，按缓存条目名称投递给界面
///
/// `failures` 记录遍历中遇到的错误。目录读取失败时 `size` 为 0，
/// 只有通过 `failures` 才能和空目录区分开。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SizeResult {
    /// 单个总大小
    Total {
        name: String,
        size: u64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        failures: Vec<String>,
    },

    /// 多根工作区的逐个文件夹大小
    Breakdown {
        name: String,
        entries: Vec<FolderSize>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        failures: Vec<String>,
    },
}

impl SizeResult {
    /// 对应的缓存条目名称
    pub fn name(&self) -> &str {
        match self {
            SizeResult::Total { name, .. } | SizeResult::Breakdown { name, .. } => name,
        }
    }

    /// 合计大小
    pub fn total(&self) -> u64 {
        match self {
            SizeResult::Total { size, .. } => *size,
            SizeResult::Breakdown { entries, .. } => entries.iter().map(|e| e.size).sum(),
        }
    }

    /// 计算过程中遇到的错误
    pub fn failures(&self) -> &[String] {
        match self {
            SizeResult::Total { failures, .. } | SizeResult::Breakdown { failures, .. } => failures,
        }
    }
}

/// 把多次大小计算中的错误合并成一条消息，每行以条目名称开头
pub fn size_failure_summary<'a, I>(results: I) -> Option<String>
where
    I: IntoIterator<Item = &'a SizeResult>,
{
    let lines: Vec<String> = results
        .into_iter()
        .flat_map(|result| {
            result
                .failures()
                .iter()
                .map(move |failure| format!("{}: {}", result.name(), failure))
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_total() {
        let result = SizeResult::Breakdown {
            name: "abc".to_string(),
            entries: vec![
                FolderSize {
                    path: PathBuf::from("/a"),
                    size: 10,
                },
                FolderSize {
                    path: PathBuf::from("/b"),
                    size: 32,
                },
            ],
            failures: Vec::new(),
        };

        assert_eq!(result.name(), "abc");
        assert_eq!(result.total(), 42);
    }

    #[test]
    fn test_failure_summary_names_entries() {
        let results = vec![
            SizeResult::Total {
                name: "ok".to_string(),
                size: 5,
                failures: Vec::new(),
            },
            SizeResult::Total {
                name: "vanished".to_string(),
                size: 0,
                failures: vec!["读取 '/s/vanished' 时出错".to_string()],
            },
        ];

        let summary = size_failure_summary(&results).unwrap();

        assert_eq!(summary, "vanished: 读取 '/s/vanished' 时出错");
        assert_eq!(size_failure_summary(&results[..1]), None);
    }

    #[test]
    fn test_failures_are_omitted_from_json_when_empty() {
        let result = SizeResult::Total {
            name: "a".to_string(),
            size: 1,
            failures: Vec::new(),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({ "name": "a", "size": 1 })
        );
    }
}
