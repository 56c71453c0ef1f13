//! Filename sanitizing for creator folders and item files.

use crate::error::{Error, Result};

/// Characters replaced in names written to disk.
fn is_reserved(c: char) -> bool {
    matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Validate and sanitize an item filename.
///
/// Item identities come from the server; anything that could escape the
/// creator folder is rejected outright.
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Sanitize a creator name for use as a folder.
///
/// Separators are replaced rather than rejected; traversal is still an error.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || is_reserved(c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_valid() {
        assert_eq!(
            sanitize_filename("5E7F1A2B-0000.txt").unwrap(),
            "5E7F1A2B-0000.txt"
        );
        assert_eq!(sanitize_filename("id:with?odd.jpg").unwrap(), "id_with_odd.jpg");
    }

    #[test]
    fn test_sanitize_filename_rejects_escapes() {
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("a/b.txt").is_err());
        assert!(sanitize_filename("a\\b.txt").is_err());
        assert!(sanitize_filename("id\0.txt").is_err());
        assert!(sanitize_filename("   ").is_err());
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("alice").unwrap(), "alice");
        assert_eq!(sanitize_path_component("a/b").unwrap(), "a_b");
        assert!(sanitize_path_component("../evil").is_err());
        assert!(sanitize_path_component("").is_err());
    }
}
