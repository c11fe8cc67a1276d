use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{DesktopEntry, DesktopEntryError, Result};

/// The XDG `applications` directories, most important first.
///
/// `$XDG_DATA_HOME/applications` comes first, followed by each directory in
/// `$XDG_DATA_DIRS` (or `/usr/local/share` and `/usr/share` when unset).
pub fn application_dirs() -> Vec<PathBuf> {
    application_dirs_from(
        dirs::data_local_dir(),
        env::var("XDG_DATA_DIRS").ok().as_deref(),
    )
}

fn application_dirs_from(data_home: Option<PathBuf>, data_dirs: Option<&str>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(data_home) = data_home {
        dirs.push(data_home.join("applications"));
    }

    match data_dirs {
        Some(data_dirs) if !data_dirs.is_empty() => {
            for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
                dirs.push(PathBuf::from(dir).join("applications"));
            }
        }
        _ => {
            dirs.push(PathBuf::from("/usr/local/share/applications"));
            dirs.push(PathBuf::from("/usr/share/applications"));
        }
    }

    dirs
}

/// Finds the file for a desktop file id in [`application_dirs`].
pub fn find_desktop_file(id: &str) -> Option<PathBuf> {
    let dirs = application_dirs();
    find_desktop_file_in(id, dirs.as_slice())
}

/// Finds the file for a desktop file id in the given directories.
///
/// `foo-bar` is looked up as `foo-bar.desktop` in every directory first, then
/// as `foo/bar.desktop`. A trailing `.desktop` on the id is ignored.
pub fn find_desktop_file_in(id: &str, dirs: &[impl AsRef<Path>]) -> Option<PathBuf> {
    let id = id.strip_suffix(".desktop").unwrap_or(id);
    if id.is_empty() {
        return None;
    }

    let mut candidates = vec![format!("{}.desktop", id)];
    if id.contains('-') {
        candidates.push(format!("{}.desktop", id.replace('-', "/")));
    }

    for candidate in &candidates {
        for dir in dirs {
            let path = dir.as_ref().join(candidate);
            if path.is_file() {
                debug!(id, path = %path.display(), "found desktop file");
                return Some(path);
            }
        }
    }
    None
}

impl DesktopEntry {
    /// Creates an entry for a desktop file id found in [`application_dirs`].
    ///
    /// The file is located now but only read when data is first needed.
    pub fn lookup(id: &str) -> Result<Self> {
        find_desktop_file(id)
            .map(Self::from_file)
            .ok_or_else(|| DesktopEntryError::NotFound(id.to_string()))
    }
}
