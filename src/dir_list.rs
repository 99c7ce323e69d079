//! Directory enumeration for the checksum manifests.
//!
//! Every directory below a root gets its own manifest describing only its
//! immediate content files, so a directory can be moved around together
//! with its manifest. This module finds those directories and lists the
//! files a manifest is supposed to cover.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Name of the manifest for a directory that has no final path component
/// (for example `.`). Also always recognized as a manifest when listing.
pub const FALLBACK_MANIFEST_NAME: &str = ".md5";

#[derive(Debug, thiserror::Error)]
pub enum DirListError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Directory walk error: {0}")]
    Walk(walkdir::Error),
}

impl DirListError {
    fn from_io(e: std::io::Error, path: &Path) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            DirListError::PermissionDenied(path.to_path_buf())
        } else {
            DirListError::Io(e)
        }
    }
}

impl From<walkdir::Error> for DirListError {
    fn from(e: walkdir::Error) -> Self {
        let permission_denied = e
            .io_error()
            .is_some_and(|io| io.kind() == ErrorKind::PermissionDenied);

        match (permission_denied, e.path()) {
            (true, Some(path)) => DirListError::PermissionDenied(path.to_path_buf()),
            _ => DirListError::Walk(e),
        }
    }
}

/// A regular file that a directory's manifest should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    pub name: String,
    pub size: u64,
}

/// Returns the file name of the manifest stored in `dir`.
pub fn manifest_file_name(dir: &Path) -> String {
    match dir.file_name() {
        Some(name) => format!("{}.md5", name.to_string_lossy()),
        None => FALLBACK_MANIFEST_NAME.to_string(),
    }
}

fn is_manifest_name(dir: &Path, name: &str) -> bool {
    name == FALLBACK_MANIFEST_NAME || name == manifest_file_name(dir)
}

/// Yields `root` and every directory below it, parents before children and
/// siblings in file name order. Symlinked directories are not followed.
pub fn walk_directories(
    root: &Path,
) -> impl Iterator<Item = Result<PathBuf, DirListError>> + use<> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_dir() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(DirListError::from(e))),
        })
}

/// Lists the content files of `dir`, sorted by name.
///
/// Content files are regular files that are not symlinks and not the
/// directory's manifest. Names that are not valid UTF-8 cannot be recorded
/// in a manifest and are skipped with a warning.
pub fn list_content_files(dir: &Path) -> Result<Vec<ContentFile>, DirListError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| DirListError::from_io(e, dir))?;

    let mut files = Vec::new();

    for entry in read_dir {
        let entry = entry.map_err(DirListError::Io)?;
        let path = entry.path();

        let metadata =
            std::fs::symlink_metadata(&path).map_err(|e| DirListError::from_io(e, &path))?;
        if !metadata.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            warn!("Skipping file with non UTF-8 name: {}", path.display());
            continue;
        };

        if is_manifest_name(dir, &name) {
            continue;
        }

        files.push(ContentFile {
            name,
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(files)
}
