//! Tag codec: comma-separated form input to an ordered tag list, and the
//! list to and from the JSON text stored in the `items.tags` column.

/// Splits a comma-separated tag string, trimming whitespace around each tag.
///
/// Order is preserved and nothing is filtered: duplicates stay, and empty
/// segments come through as empty strings (`""` yields `[""]`).
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(|tag| tag.trim().to_string()).collect()
}

pub fn encode_tags(tags: &[String]) -> serde_json::Result<String> {
    serde_json::to_string(tags)
}

pub fn decode_tags(column: &str) -> serde_json::Result<Vec<String>> {
    serde_json::from_str(column)
}
