use std::path::{Path, PathBuf};

use crate::audit::*;

/// The area code of a result document: its file name without extension.
pub fn area_code_of(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// The `.json` files of a directory, sorted by file name.
pub fn json_files(dir: &Path) -> AuditResult<Vec<PathBuf>> {
    let path = dir.display().to_string();
    let mut res: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).context(ListingDirSnafu { path: &path })? {
        let entry = entry.context(ListingDirSnafu { path: &path })?;
        let p = entry.path();
        if p.is_file() && p.extension().map(|e| e == "json").unwrap_or(false) {
            res.push(p);
        }
    }
    res.sort();
    Ok(res)
}

pub fn resolve_path(root: &Path, p: &str) -> PathBuf {
    let candidate = Path::new(p);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}
