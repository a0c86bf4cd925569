//! Small pure helpers shared by the title source, task generator and CLI.

use std::path::Path;

/// Page URL for `title`: spaces become underscores, then the title is percent-encoded
/// and appended to `base_prefix`. Deterministic; underscores and unreserved characters pass through.
pub fn target_url(base_prefix: &str, title: &str) -> String {
    let underscored = title.replace(' ', "_");
    format!("{}{}", base_prefix, urlencoding::encode(&underscored))
}

/// True when the file name of `path` starts with `prefix`. An empty prefix accepts every file.
pub fn has_dump_prefix(path: &Path, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(prefix))
}

/// Fetch timeout from seconds, clamped to at least one second so a zero never removes the bound.
pub fn timeout_from_secs(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs.max(1))
}
