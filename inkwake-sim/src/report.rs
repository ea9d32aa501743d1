//! Build report formatting, shared with build.rs

/// Shorten a report line to `width` characters, marking the cut
pub fn truncate(line: &str, width: usize) -> String {
    if line.chars().count() > width {
        let head: String = line.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_line_unchanged() {
        assert_eq!(truncate("ssid too long", 62), "ssid too long");
    }

    #[test]
    fn test_long_line_cut_on_char_boundary() {
        let line = format!("network {}", "café ".repeat(20));
        let cut = truncate(&line, 62);
        assert_eq!(cut.chars().count(), 62);
        assert!(cut.ends_with("..."));
        assert!(line.starts_with(cut.trim_end_matches("...")));
    }
}
