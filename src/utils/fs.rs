//! File system utilities.

use crate::utils::hash;
use crate::{Error, Result};
use std::path::Path;

/// Check if a path exists and is a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.display().to_string()));
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory(path.display().to_string()));
    }
    Ok(())
}

/// Move a file, creating the destination's parent directories.
///
/// Tries an atomic rename first. On a cross-filesystem move it falls back
/// to copy + delete with a checksum verification of the copy; a mismatch
/// removes the incomplete copy and leaves the source in place.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match std::fs::rename(from, to) {
        Ok(()) => {
            tracing::debug!("Moved (rename): {:?} -> {:?}", from, to);
            return Ok(());
        }
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!("Cross-filesystem move detected, using copy+delete");
        }
        Err(e) => {
            return Err(Error::ActionExecutionFailed(format!(
                "failed to move {:?}: {}",
                from, e
            )));
        }
    }

    let original = hash::sha256_file(from)?;
    std::fs::copy(from, to)?;
    let copied = hash::sha256_file(to)?;
    if original != copied {
        let _ = std::fs::remove_file(to);
        return Err(Error::ActionExecutionFailed(format!(
            "checksum mismatch after copying {:?}",
            to
        )));
    }
    std::fs::remove_file(from)?;
    tracing::debug!("Moved (copy+delete): {:?} -> {:?}", from, to);
    Ok(())
}

/// Remove a file's parent directory if the move left it empty.
/// Best-effort; failures are swallowed. Directories listed in
/// `protected` (watch folder, issues folder, library and show roots)
/// are never removed.
pub fn delete_empty_parent(path: &Path, protected: &[std::path::PathBuf]) {
    let Some(parent) = path.parent() else {
        return;
    };
    if protected.iter().any(|root| root.as_path() == parent) {
        return;
    }
    let is_empty = std::fs::read_dir(parent)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        if let Err(e) = std::fs::remove_dir(parent) {
            tracing::debug!("Could not remove empty folder {:?}: {}", parent, e);
        }
    }
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "m4v", "ts", "m2ts", "flv", "webm", "mpg", "mpeg",
];

/// Check if a file is a video file based on extension.
pub fn is_video_file(path: &Path) -> bool {
    get_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
