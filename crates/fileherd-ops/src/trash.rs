//! Helpers for items that live in the system trash.
//!
//! A trashed item is stored as a data file whose name starts with the data
//! prefix (`$R...`) next to a metadata companion that carries the info
//! prefix instead (`$I...`). Both have to go when the item leaves the trash.

use std::path::{Path, PathBuf};

use fileherd_core::{split_file_name, OrchestratorConfig};

/// Whether `path` lies inside one of the configured trash directories.
pub fn is_in_trash(path: &Path, config: &OrchestratorConfig) -> bool {
    let text = path.to_string_lossy();
    text.split(['\\', '/']).any(|component| {
        config
            .trash_dir_names
            .iter()
            .any(|name| component.eq_ignore_ascii_case(name))
    })
}

/// Path of the metadata companion of a trashed data file.
///
/// Returns `None` when the file name does not carry the data prefix.
pub fn info_companion(path: &Path, config: &OrchestratorConfig) -> Option<PathBuf> {
    let text = path.to_string_lossy();
    let (parent, name) = split_file_name(&text);
    let rest = name.strip_prefix(config.trash_data_prefix.as_str())?;

    // Keep whichever separator the path already uses.
    let separator = &text[parent.len()..text.len() - name.len()];
    Some(PathBuf::from(format!(
        "{parent}{separator}{}{rest}",
        config.trash_info_prefix
    )))
}
