//! Output trimming for tool responses.

/// Return the last `tail` lines of `text`, joined with `\n`.
///
/// A trailing newline does not count as an extra empty line. `tail == 0`
/// yields an empty string.
pub fn tail_lines(text: &str, tail: usize) -> String {
    if tail == 0 {
        return String::new();
    }
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(tail);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_lines() {
        assert_eq!(tail_lines("a\nb\nc\nd\n", 2), "c\nd");
    }

    #[test]
    fn shorter_output_is_returned_whole() {
        assert_eq!(tail_lines("a\nb", 100), "a\nb");
    }

    #[test]
    fn zero_tail_is_empty() {
        assert_eq!(tail_lines("a\nb\n", 0), "");
    }

    #[test]
    fn empty_output_stays_empty() {
        assert_eq!(tail_lines("", 5), "");
    }

    #[test]
    fn crlf_lines_are_split() {
        assert_eq!(tail_lines("x\r\ny\r\n", 1), "y");
    }
}
