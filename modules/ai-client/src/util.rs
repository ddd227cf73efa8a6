/// Truncate a string to at most `max_bytes` bytes at a character boundary.
///
/// Prompts are built from video descriptions and transcripts that are mostly
/// multi-byte Hangul, so slicing at a raw byte offset would panic.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip a markdown code fence wrapped around a model response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
