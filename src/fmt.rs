/// Format a whole-unit amount with thousands separators: 1,234 / -1,234
pub fn amount(val: i64) -> String {
    let digits = val.unsigned_abs().to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if val < 0 {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_formatting() {
        assert_eq!(amount(1234), "1,234");
        assert_eq!(amount(-55662), "-55,662");
        assert_eq!(amount(0), "0");
        assert_eq!(amount(1_000_000), "1,000,000");
        assert_eq!(amount(999), "999");
        assert_eq!(amount(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
