/// Characters kept in a chunk node label.
pub const LABEL_CHARS: usize = 80;
/// Characters kept in the chunk preview attribute.
pub const ATTRIBUTE_CHARS: usize = 200;
pub const TRUNCATION_MARKER: &str = "...";

/// First `max_chars` characters of `text` with whitespace runs collapsed,
/// followed by [`TRUNCATION_MARKER`] when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", collapsed[..cut].trim_end(), TRUNCATION_MARKER),
        None => collapsed,
    }
}
