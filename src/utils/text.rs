use scraper::ElementRef;

/// Collapse whitespace runs in DOM text. Entities are already decoded by the parser.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenated text of every matched node, in document order.
pub fn selection_text<'a, I>(nodes: I) -> String
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    nodes
        .into_iter()
        .flat_map(|node| node.text())
        .collect::<String>()
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
