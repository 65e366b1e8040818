use crate::config::SizeUnit;

const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

/// 格式化字节数为友好显示格式 (例如: "1.50 MB")
pub fn format_size(size: u64) -> String {
    let mut exponent = 0;
    let mut scaled = size;
    while scaled >= 1024 && exponent < UNITS.len() - 1 {
        scaled /= 1024;
        exponent += 1;
    }

    format!("{:.2} {}", size as f64 / 1024f64.powi(exponent as i32), UNITS[exponent])
}

/// 按配置的单位格式化字节数
pub fn format_size_with_unit(size: u64, unit: SizeUnit) -> String {
    match unit {
        SizeUnit::Auto => format_size(size),
        SizeUnit::Bytes => format!("{} B", size),
        SizeUnit::KB => format!("{:.2} kB", size as f64 / 1024.0),
        SizeUnit::MB => format!("{:.2} MB", size as f64 / (1024.0 * 1024.0)),
        SizeUnit::GB => format!("{:.2} GB", size as f64 / (1024.0 * 1024.0 * 1024.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1024), "1.00 kB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(1536 * 1024), "1.50 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_format_size_with_unit() {
        assert_eq!(format_size_with_unit(2048, SizeUnit::Bytes), "2048 B");
        assert_eq!(format_size_with_unit(2048, SizeUnit::KB), "2.00 kB");
        assert_eq!(format_size_with_unit(2048, SizeUnit::Auto), "2.00 kB");
    }
}
