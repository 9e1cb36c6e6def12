//! Group key extraction from source filenames
//!
//! Several photographs of one item share the prefix before the first hyphen:
//! `A737-001.jpeg` and `A737-002.jpeg` both belong to item `A737`.

use std::path::Path;

/// Derive the item key from a source filename
///
/// **Rule:**
/// - Hyphen present: everything before the first hyphen
/// - No hyphen: the file stem (`B1.jpeg` → `B1`)
/// - No hyphen and no extension: the whole string
pub fn group_key(source: &str) -> String {
    if let Some((prefix, _)) = source.split_once('-') {
        return prefix.to_string();
    }

    Path::new(source)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(source)
        .to_string()
}
