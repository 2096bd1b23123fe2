use console::Style;

// ── Styles ──────────────────────────────────────────────────────────────────

pub fn style_success() -> Style {
    Style::new().green()
}

pub fn style_error() -> Style {
    Style::new().red()
}

pub fn style_warn() -> Style {
    Style::new().yellow()
}

pub fn style_info() -> Style {
    Style::new().cyan()
}

pub fn style_bold() -> Style {
    Style::new().bold()
}

pub fn style_dim() -> Style {
    Style::new().dim()
}

// ── Numbers ─────────────────────────────────────────────────────────────────

/// Thousands-separated integer: `1234567` → `1,234,567`.
pub fn format_count(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Thousands-separated decimal with a fixed number of fraction digits.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (whole, frac) = match fixed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (fixed.as_str(), None),
    };
    let whole = whole.parse::<u64>().map(format_count).unwrap_or_else(|_| whole.to_string());
    let sign = if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac {
        Some(f) => format!("{sign}{whole}.{f}"),
        None => format!("{sign}{whole}"),
    }
}

/// Percentage with one decimal: `12.345` → `12.3%`.
pub fn format_pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// Signed percentage: `+12%`, `-3%`.
pub fn format_signed_pct(value: f64) -> String {
    format!("{value:+.0}%")
}

/// Parse a count that may carry thousands separators.
pub fn parse_count(s: &str) -> Option<u64> {
    s.replace(',', "").trim().parse().ok()
}

/// First `len` characters of a validator id.
pub fn short_id(id: &str, len: usize) -> &str {
    match id.char_indices().nth(len) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

// ── Display helpers ─────────────────────────────────────────────────────────

pub fn print_success(msg: &str) {
    println!("  {} {}", style_success().apply_to("✓"), msg);
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", style_warn().apply_to("!"), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", style_error().apply_to("✗"), msg);
}

pub fn print_heading(title: &str) {
    println!();
    println!("  {}", style_bold().apply_to(title));
    println!("  {}", style_dim().apply_to("─".repeat(title.chars().count())));
}

pub fn print_kv(key: &str, value: impl std::fmt::Display) {
    println!("  {:<28} {}", style_dim().apply_to(key), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(210_865), "210,865");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(1234.5, 2), "1,234.50");
        assert_eq!(format_decimal(-1234.567, 1), "-1,234.6");
        assert_eq!(format_decimal(3.0, 0), "3");
        assert_eq!(format_decimal(-0.001, 1), "0.0");
    }

    #[test]
    fn test_pct() {
        assert_eq!(format_pct(12.345), "12.3%");
        assert_eq!(format_signed_pct(211.4), "+211%");
        assert_eq!(format_signed_pct(-3.2), "-3%");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3,778"), Some(3778));
        assert_eq!(parse_count(" 12 "), Some(12));
        assert_eq!(parse_count("-"), None);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("HEL1USMZKAL2odpN", 8), "HEL1USMZ");
        assert_eq!(short_id("abc", 8), "abc");
    }
}
