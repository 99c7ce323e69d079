//! Reading and writing `<dirname>.md5` manifests.
//!
//! A manifest is plain md5sum output: one `<hex digest>  <file name>` line
//! per content file of the directory it lives in. Manifests are written
//! from the raw hash output exactly as produced, and parsed leniently:
//! lines that do not look like md5sum output are dropped.

use crate::dir_list::manifest_file_name;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Number of hex characters in an MD5 digest.
pub const DIGEST_HEX_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

impl ManifestError {
    fn from_io(e: std::io::Error, path: &Path) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            ManifestError::PermissionDenied(path.to_path_buf())
        } else {
            ManifestError::Io(e)
        }
    }
}

/// File name to lowercase hex digest, ordered by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: BTreeMap<String, String>,
}

/// A manifest as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedManifest {
    pub path: PathBuf,
    pub manifest: Manifest,
    /// Modification time of the manifest file, if the platform reports one.
    pub modified: Option<SystemTime>,
}

impl Manifest {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Manifest { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parses md5sum style output. Malformed lines are discarded.
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut entries = BTreeMap::new();

        for line in text.lines() {
            match parse_line(line) {
                Some((name, digest)) => {
                    entries.insert(name, digest);
                }
                None if line.trim().is_empty() => {}
                None => debug!("Discarding malformed manifest line: {:?}", line),
            }
        }

        Manifest { entries }
    }

    /// Loads the manifest of `dir`, or `None` if it has none.
    pub fn load(dir: &Path) -> Result<Option<LoadedManifest>, ManifestError> {
        let path = manifest_path(dir);

        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ManifestError::from_io(e, &path)),
        };

        let modified = std::fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .ok();

        let manifest = Manifest::parse(&raw);
        debug!(
            "Loaded {} entries from {}",
            manifest.len(),
            path.display()
        );

        Ok(Some(LoadedManifest {
            path,
            manifest,
            modified,
        }))
    }
}

/// Path of the manifest that describes `dir`.
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(manifest_file_name(dir))
}

/// Formats one md5sum line, including the trailing newline.
///
/// Names containing a backslash, newline or carriage return use md5sum's
/// escaped form: the line starts with `\` and those characters are written
/// as `\\`, `\n` and `\r`.
pub fn format_entry(digest: &str, name: &str) -> String {
    if name.contains(['\\', '\n', '\r']) {
        let escaped = name
            .replace('\\', "\\\\")
            .replace('\n', "\\n")
            .replace('\r', "\\r");
        format!("\\{}  {}\n", digest, escaped)
    } else {
        format!("{}  {}\n", digest, name)
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (escaped, line) = match line.strip_prefix('\\') {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let (digest, rest) = line.split_at_checked(DIGEST_HEX_LEN)?;
    if !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    // md5sum separates with " *" in binary mode and "  " in text mode.
    let name = rest
        .strip_prefix(" *")
        .or_else(|| rest.strip_prefix("  "))
        .unwrap_or_else(|| rest.trim_start());
    if name.is_empty() {
        return None;
    }

    let name = if escaped {
        unescape_name(name)?
    } else {
        name.to_string()
    };

    Some((name, digest.to_ascii_lowercase()))
}

fn unescape_name(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }

    Some(out)
}

/// Writes `raw` as the manifest at `path`, replacing any existing file.
///
/// Writes to a temporary file in the same directory, fsyncs it, then
/// atomically renames it into place, so readers only ever see the old or
/// the new manifest. An existing manifest's permissions are kept.
pub fn save(path: &Path, raw: &[u8]) -> Result<(), ManifestError> {
    use std::io::Write;

    let parent = path.parent().unwrap_or(Path::new("."));

    let existing_permissions = std::fs::metadata(path).ok().map(|m| m.permissions());

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| ManifestError::from_io(e, parent))?;

    temp_file
        .write_all(raw)
        .map_err(|e| ManifestError::from_io(e, path))?;

    if let Some(permissions) = existing_permissions.or_else(default_permissions) {
        temp_file
            .as_file()
            .set_permissions(permissions)
            .map_err(ManifestError::Io)?;
    }

    temp_file.as_file().sync_all().map_err(ManifestError::Io)?;

    temp_file
        .persist(path)
        .map_err(|e| ManifestError::from_io(e.error, path))?;

    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<std::fs::Permissions> {
    None
}
