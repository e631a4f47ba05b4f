/// Split `text` into segments of at most `limit` characters.
///
/// Each cut is made after the last newline inside the window, when there is
/// one, so paragraphs stay whole; the newline itself is dropped. Otherwise
/// the cut falls on a character boundary. Empty text yields no segments.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut segments = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past the `limit`-th character, or the whole rest.
        let window_end = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(idx, _)| idx);

        if window_end == rest.len() {
            segments.push(rest.to_string());
            break;
        }

        let window = &rest[..window_end];
        match window.rfind('\n') {
            Some(nl) if nl > 0 => {
                segments.push(window[..nl].to_string());
                rest = &rest[nl + 1..];
            }
            _ => {
                segments.push(window.to_string());
                rest = &rest[window_end..];
            }
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_segments() {
        assert!(split_message("", 4000).is_empty());
    }

    #[test]
    fn short_text_is_one_segment() {
        assert_eq!(split_message("hello", 4000), ["hello"]);
    }

    #[test]
    fn breaks_at_last_newline_in_window() {
        assert_eq!(
            split_message("aaa\nbbb\ncccc", 9),
            ["aaa\nbbb", "cccc"]
        );
    }

    #[test]
    fn hard_break_without_newline() {
        assert_eq!(split_message("abcdefghij", 4), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ж".repeat(10);
        let segments = split_message(&text, 4);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.chars().count() <= 4));
        assert_eq!(segments.concat(), text);
    }

    #[test]
    fn segments_respect_limit_and_rejoin() {
        let text = (0..500)
            .map(|i| format!("line number {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let segments = split_message(&text, 4000);
        assert!(segments.len() > 1);
        assert!(segments.iter().all(|s| s.chars().count() <= 4000));
        assert_eq!(segments.join("\n"), text);
    }
}
