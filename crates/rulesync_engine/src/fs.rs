//! Small filesystem helpers shared by the directory-backed collaborators.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Characters allowed in file stems derived from keys.
fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Returns `dir/<stem>.json`, or `None` if `stem` is not a safe file name.
pub(crate) fn json_path(dir: &Path, stem: &str) -> Option<PathBuf> {
    if stem.is_empty() || stem.starts_with('.') || !stem.chars().all(is_safe) {
        return None;
    }
    Some(dir.join(format!("{stem}.json")))
}

/// Replaces `path` with `contents` via a synced temp file and a rename, so
/// readers see either the old or the new contents.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
