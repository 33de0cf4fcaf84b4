use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Accepts `.jpg`, `.jpeg` and `.png` names, case-insensitively.
pub fn is_valid_image(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Reduces a client-supplied filename to a flat, ASCII-only name that is
/// safe to join onto the upload directory.
///
/// Characters are NFKD-decomposed first so accented and compatibility
/// letters keep their ASCII base (`café` becomes `cafe`). Path separators
/// become word breaks, whitespace runs collapse to `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped, and leading or trailing `.`/`_` are
/// stripped so the result can never name a parent directory.
/// The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// `<32 hex chars>_<sanitized name>`: unique per call, so uploads sharing an
/// original filename never overwrite each other.
pub fn storage_filename(filename: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), secure_filename(filename))
}
