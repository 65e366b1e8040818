use std::path::PathBuf;

pub struct DefaultConfig;

impl DefaultConfig {
    /// 已知的编辑器产品目录名
    pub const KNOWN_PRODUCTS: [&'static str; 5] = [
        "Code",
        "Code - Insiders",
        "VSCodium",
        "Code - OSS",
        "Cursor",
    ];

    /// 是否是已知的产品目录名
    pub fn is_known_product(product: &str) -> bool {
        Self::KNOWN_PRODUCTS.contains(&product)
    }

    /// 默认的编辑器产品
    pub fn default_product() -> &'static str {
        "Code"
    }

    /// 默认的 workspaceStorage 目录: <配置目录>/<product>/User/workspaceStorage
    pub fn default_storage_root(product: &str) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(product).join("User").join("workspaceStorage"))
    }

    /// 默认的文件 stat 并发上限
    pub fn default_max_concurrent_stats() -> usize {
        num_cpus::get().max(4) * 8 // 至少32个并发
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_storage_root_layout() {
        if let Some(root) = DefaultConfig::default_storage_root("Code") {
            assert!(root.ends_with("Code/User/workspaceStorage"));
        }
    }

    #[test]
    fn test_known_products() {
        assert!(DefaultConfig::is_known_product(DefaultConfig::default_product()));
        assert!(DefaultConfig::is_known_product("VSCodium"));
        assert!(!DefaultConfig::is_known_product("code"));
    }

    #[test]
    fn test_default_concurrency_has_floor() {
        assert!(DefaultConfig::default_max_concurrent_stats() >= 32);
    }
}
