use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::{PlayerError, Result};

use super::model::{DirectorySnapshot, Listing};

pub(crate) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

/// `folder` as an absolute path, resolved against `cwd` when relative.
///
/// `.` and `..` are resolved so that the parent of the result is the real
/// parent folder. A folder that cannot be resolved is returned joined but
/// unresolved; listing it reports the error.
pub fn absolute_folder(cwd: &Path, folder: &Path) -> PathBuf {
    let joined = cwd.join(folder);
    match fs::canonicalize(&joined) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(path = %joined.display(), error = %e, "cannot resolve folder");
            joined
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// List the direct children of `dir`: folders and audio files, each sorted ascending
/// (case-sensitive).
///
/// Fails with [`PlayerError::Io`] when `dir` itself cannot be read. Unreadable
/// individual entries are skipped.
pub fn list(dir: &Path, settings: &LibrarySettings) -> Result<Listing> {
    // WalkDir yields the root itself at depth 0; surface its error instead of an empty listing.
    std::fs::read_dir(dir).map_err(|e| PlayerError::io(dir, e))?;

    let mut listing = Listing::default();

    for entry in WalkDir::new(dir)
        .follow_links(settings.follow_links)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
    {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!(path = %entry.path().display(), "skipping non UTF-8 name");
            continue;
        };
        if !settings.include_hidden && is_hidden(&name) {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            listing.folders.push(name);
        } else if file_type.is_file() && is_audio_file(entry.path(), settings) {
            listing.files.push(name);
        }
    }

    listing.folders.sort();
    listing.files.sort();
    Ok(listing)
}

impl DirectorySnapshot {
    /// List `dir` and build a snapshot from it.
    pub fn load(dir: &Path, settings: &LibrarySettings) -> Result<Self> {
        let listing = list(dir, settings)?;
        debug!(
            dir = %dir.display(),
            folders = listing.folders.len(),
            files = listing.files.len(),
            "listed folder"
        );
        Ok(Self::from_listing(dir, listing))
    }
}
