//! 通用工具函数

/// 规范化外部输入的标签：去除首尾空白并转为小写
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 将分钟数格式化为便于显示的文本
pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}min", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{:02}min", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Severe\t"), "severe");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(40), "40min");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(75), "1h15min");
    }
}
