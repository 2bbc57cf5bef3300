//! Entry name validation

use crate::{FsError, Result};

/// Longest accepted entry name, in bytes
pub const NAME_MAX_BYTES: usize = 255;

/// Characters that would break the path hierarchy
const SEPARATOR_CHARS: &[char] = &['/', '\\'];

/// Validate a display name for a file or folder
///
/// Rejects empty or blank names, surrounding whitespace, `.` and `..`, path
/// separators, control characters and names longer than [`NAME_MAX_BYTES`].
///
/// Surrounding whitespace is refused because [`crate::VirtualPath::parse`]
/// trims its input; such a name would not survive a path round trip.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(FsError::InvalidName("name must not be empty".to_string()));
    }

    if name.trim() != name {
        return Err(FsError::InvalidName(format!(
            "'{}' starts or ends with whitespace",
            name
        )));
    }

    if name == "." || name == ".." {
        return Err(FsError::InvalidName(format!("'{}' is reserved", name)));
    }

    if let Some(c) = name.chars().find(|c| SEPARATOR_CHARS.contains(c)) {
        return Err(FsError::InvalidName(format!(
            "'{}' contains the path separator '{}'",
            name, c
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(FsError::InvalidName(format!(
            "'{}' contains control characters",
            name.escape_debug()
        )));
    }

    if name.len() > NAME_MAX_BYTES {
        return Err(FsError::InvalidName(format!(
            "name is {} bytes long (max {})",
            name.len(),
            NAME_MAX_BYTES
        )));
    }

    Ok(())
}

/// Check if a name is acceptable for an entry
pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}
