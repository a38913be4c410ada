//! Shared text helpers for user-facing replies.

use std::time::Duration;

/// Formats a duration as seconds with two decimals, e.g. `4.25s`.
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

/// Joins items as an English list of code spans: `` `a`, `b` and `c` ``.
pub fn humanize_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => format!("`{}`", only.as_ref()),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(|item| format!("`{}`", item.as_ref()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{head} and `{}`", last.as_ref())
        }
    }
}

/// Returns `word` or `word` + "s" depending on `count`.
pub fn plural(count: u64, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Truncates a string to a maximum number of characters with ellipsis.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_millis(4250)), "4.25s");
        assert_eq!(format_seconds(Duration::ZERO), "0.00s");
    }

    #[test]
    fn test_humanize_list() {
        assert_eq!(humanize_list::<&str>(&[]), "");
        assert_eq!(humanize_list(&["pb"]), "`pb`");
        assert_eq!(humanize_list(&["pb", "!"]), "`pb` and `!`");
        assert_eq!(humanize_list(&["a", "b", "c"]), "`a`, `b` and `c`");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "use"), "use");
        assert_eq!(plural(0, "use"), "uses");
        assert_eq!(plural(7, "use"), "uses");
    }

    #[test]
    fn test_truncate_string() {
        let input = "This is a very long string that should be truncated";
        assert_eq!(truncate_string(input, 20), "This is a very lo...");
        assert_eq!(truncate_string("Short", 20), "Short");
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }
}
