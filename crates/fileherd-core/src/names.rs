//! Filename validation.

use crate::error::ModelError;

/// Characters the host filesystem refuses in a single name component.
const INVALID_CHARS: [char; 10] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Device names that cannot be used as a file name, with or without extension.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Maximum length of a single name component.
pub const MAX_NAME_LEN: usize = 255;

/// Validate a new name for a file or directory.
pub fn validate_filename(name: &str) -> Result<(), ModelError> {
    let invalid = |reason: String| ModelError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty".into()));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(format!(
            "name is too long (max {MAX_NAME_LEN} characters)"
        )));
    }

    if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Err(invalid(format!("name cannot contain {c:?}")));
    }

    if name == "." || name == ".." {
        return Err(invalid("'.' and '..' are reserved names".into()));
    }

    let upper = name.to_uppercase();
    let stem = upper.split('.').next().unwrap_or_default();
    if RESERVED_NAMES.contains(&stem) {
        return Err(invalid(format!("'{stem}' is a reserved device name")));
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(invalid("name cannot start or end with spaces".into()));
    }

    if name.ends_with('.') {
        return Err(invalid("name cannot end with a dot".into()));
    }

    Ok(())
}

/// Check a name without caring why it is invalid.
pub fn is_valid_filename(name: &str) -> bool {
    validate_filename(name).is_ok()
}
