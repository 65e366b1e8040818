use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use anyhow::Result;

use crate::config::defaults::DefaultConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// workspaceStorage 位置
    pub storage: StorageConfig,

    /// 大小计算配置
    pub size: SizeConfig,

    /// 删除配置
    pub delete: DeleteConfig,

    /// 显示配置
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// 显式指定的 workspaceStorage 目录，设置后忽略 product
    pub root: Option<String>,

    /// 编辑器产品目录名 (Code, Code - Insiders, VSCodium, Cursor ...)
    pub product: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SizeConfig {
    /// 单个目录内并发 stat 的文件数上限
    pub max_concurrent_stats: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeleteConfig {
    /// 是否移动到回收站而不是直接删除
    pub use_trash: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// 大小显示单位
    pub size_unit: SizeUnit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum SizeUnit {
    Auto,
    Bytes,
    KB,
    MB,
    GB,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            size: SizeConfig::default(),
            delete: DeleteConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            product: DefaultConfig::default_product().to_string(),
        }
    }
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_stats: DefaultConfig::default_max_concurrent_stats(),
        }
    }
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self { use_trash: false }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            size_unit: SizeUnit::Auto,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        // 确保目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 获取默认配置文件路径
    pub fn default_config_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("无法找到配置目录"))?;
        path.push("workspace-storage-cleanup");
        path.push("config.toml");
        Ok(path)
    }

    /// 加载配置，如果文件不存在则创建默认配置
    pub fn load_or_create_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// 解析实际使用的 workspaceStorage 目录
    pub fn storage_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.storage.root {
            return Ok(PathBuf::from(root));
        }

        let product = &self.storage.product;
        if !DefaultConfig::is_known_product(product) {
            tracing::warn!(
                "未知的产品目录 {}，已知的有: {}",
                product,
                DefaultConfig::KNOWN_PRODUCTS.join(", ")
            );
        }

        DefaultConfig::default_storage_root(product)
            .ok_or_else(|| anyhow::anyhow!("无法找到 {} 的 workspaceStorage 目录", product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.root = Some("/tmp/storage".to_string());
        config.delete.use_trash = true;
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nproduct = \"VSCodium\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();

        assert_eq!(config.storage.product, "VSCodium");
        assert_eq!(config.size, SizeConfig::default());
        assert!(!config.delete.use_trash);
    }

    #[test]
    fn test_explicit_storage_root_wins() {
        let mut config = Config::default();
        config.storage.root = Some("/custom/workspaceStorage".to_string());

        assert_eq!(config.storage_root().unwrap(), PathBuf::from("/custom/workspaceStorage"));
    }
}
