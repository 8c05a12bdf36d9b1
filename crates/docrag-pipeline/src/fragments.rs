/// Split an answer into sentence-sized pieces for incremental delivery.
///
/// A piece ends after `.`, `!` or `?` followed by whitespace, or at a blank
/// line; trailing whitespace stays with the piece it follows, so the pieces
/// concatenate back to `text`.
pub fn split_fragments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '.' | '!' | '?' => chars.peek().is_some_and(|(_, n)| n.is_whitespace()),
            '\n' => chars.peek().is_some_and(|(_, n)| *n == '\n' || *n == '\r'),
            _ => false,
        };
        if !boundary { continue; }
        let mut end = i + c.len_utf8();
        while let Some(&(j, n)) = chars.peek() {
            if !n.is_whitespace() { break; }
            end = j + n.len_utf8();
            chars.next();
        }
        out.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_and_paragraphs() {
        let text = "Hello. World! Is it?\n\nNew paragraph v1.2 stays whole";
        let parts = split_fragments(text);
        assert_eq!(parts, vec!["Hello. ", "World! ", "Is it?\n\n", "New paragraph v1.2 stays whole"]);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn empty_and_unterminated() {
        assert!(split_fragments("").is_empty());
        assert_eq!(split_fragments("no punctuation"), vec!["no punctuation"]);
        assert_eq!(split_fragments("ends here. "), vec!["ends here. "]);
    }
}
