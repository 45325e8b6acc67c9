//! Decides whether a batch can go to the privileged executor.

use std::path::Path;

use fileherd_core::OrchestratorConfig;

/// Check whether every path can be handled by the privileged executor.
///
/// A single disqualified path sends the whole request to the fallback
/// engine; requests are never split between the two.
pub fn is_privileged_eligible<'p, I>(paths: I, config: &OrchestratorConfig) -> bool
where
    I: IntoIterator<Item = &'p Path>,
{
    paths.into_iter().all(|path| is_eligible_path(path, config))
}

/// Check a single path.
pub fn is_eligible_path(path: &Path, config: &OrchestratorConfig) -> bool {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return false;
    }
    if !config.long_path_prefix.is_empty() && text.starts_with(config.long_path_prefix.as_str()) {
        return false;
    }
    !is_remote_path(&text, config) && !is_inside_archive(&text, config)
}

/// Whether `path` uses one of the configured remote transfer schemes.
pub fn is_remote_path(path: &str, config: &OrchestratorConfig) -> bool {
    config.remote_schemes.iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

/// Whether `path` points at an entry inside a browsable archive, i.e. some
/// component before the last one carries an archive extension.
pub fn is_inside_archive(path: &str, config: &OrchestratorConfig) -> bool {
    let mut components: Vec<&str> = path.split(['\\', '/']).filter(|c| !c.is_empty()).collect();
    components.pop();

    components.iter().any(|component| {
        let lower = component.to_lowercase();
        config
            .archive_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    })
}
