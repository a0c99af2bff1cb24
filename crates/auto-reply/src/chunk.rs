/// Longest message the platform accepts, in characters.
pub const PLATFORM_MAX_CHARS: usize = 2000;

/// Segment size used once a message is too long to send whole.
pub const CHUNK_CHARS: usize = 1900;

/// Split `text` into sendable segments.
///
/// Text within `max_chars` is sent as one segment; longer text is cut into
/// fixed `chunk_chars` runs on `char` boundaries. Concatenating the segments
/// always reproduces `text`. Empty text yields no segments.
pub fn chunk_text(text: &str, max_chars: usize, chunk_chars: usize) -> Vec<String> {
    if text.is_empty() || chunk_chars == 0 {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let split_at = remaining
            .char_indices()
            .nth(chunk_chars)
            .map_or(remaining.len(), |(idx, _)| idx);
        let (head, tail) = remaining.split_at(split_at);
        chunks.push(head.to_string());
        remaining = tail;
    }
    chunks
}

/// [`chunk_text`] with the platform limits.
pub fn chunk_message(text: &str) -> Vec<String> {
    chunk_text(text, PLATFORM_MAX_CHARS, CHUNK_CHARS)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn short_message_is_one_segment() {
        assert_eq!(chunk_message("hello"), vec!["hello"]);
    }

    #[test]
    fn empty_message_has_no_segments() {
        assert!(chunk_message("").is_empty());
    }

    #[test]
    fn at_the_cap_is_not_split() {
        let text = "a".repeat(PLATFORM_MAX_CHARS);
        assert_eq!(chunk_message(&text).len(), 1);
    }

    #[test]
    fn long_message_splits_1900_then_rest() {
        let text = "a".repeat(2500);
        let chunks = chunk_message(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 1900);
        assert_eq!(chunks[1].len(), 600);
    }

    #[rstest]
    #[case(2001)]
    #[case(3800)]
    #[case(3801)]
    #[case(10_000)]
    fn chunks_are_bounded_and_lossless(#[case] len: usize) {
        let text: String = "héllo wörld 🐱 ".chars().cycle().take(len).collect();
        let chunks = chunk_message(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= CHUNK_CHARS));
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks.len(), len.div_ceil(CHUNK_CHARS));
    }

    #[test]
    fn multibyte_boundaries() {
        let text = "л".repeat(2001);
        let chunks = chunk_message(&text);
        assert_eq!(chunks[0].chars().count(), 1900);
        assert_eq!(chunks[1].chars().count(), 101);
    }
}
