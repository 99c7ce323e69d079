use crate::manifest::{Manifest, format_entry};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("File modified during checksumming: {0}")]
    ConcurrentModification(PathBuf),
    #[error("Failed to run hash program {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Hash program {program} failed in {dir} ({status}): {stderr}")]
    ExternalFailure {
        program: String,
        dir: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

fn io_error(e: std::io::Error, path: &Path) -> ChecksumError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ChecksumError::PermissionDenied(path.to_path_buf())
    } else {
        ChecksumError::Io(e)
    }
}

/// The digests of one directory's content files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestBatch {
    /// md5sum formatted output, written verbatim as the new manifest.
    pub raw: Vec<u8>,
    pub digests: Manifest,
}

/// Computes digests for the content files of a directory in one batch.
pub trait HashProvider {
    /// `names` are relative to `dir` and already sorted.
    fn compute_digests(&self, dir: &Path, names: &[String]) -> Result<DigestBatch, ChecksumError>;
}

/// Hashes files in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Hasher;

impl HashProvider for Md5Hasher {
    fn compute_digests(&self, dir: &Path, names: &[String]) -> Result<DigestBatch, ChecksumError> {
        let mut raw = String::new();
        let mut digests = BTreeMap::new();

        for name in names {
            let checksum = checksum_file(&dir.join(name))?;
            raw.push_str(&format_entry(&checksum.md5, name));
            digests.insert(name.clone(), checksum.md5);
        }

        Ok(DigestBatch {
            raw: raw.into_bytes(),
            digests: Manifest::new(digests),
        })
    }
}

/// Hashes files by running an md5sum compatible program once per
/// directory, as `<program> -- <names>...` inside the directory.
#[derive(Debug, Clone)]
pub struct ExternalHasher {
    pub program: String,
}

impl HashProvider for ExternalHasher {
    fn compute_digests(&self, dir: &Path, names: &[String]) -> Result<DigestBatch, ChecksumError> {
        info!(
            "Running {} on {} files in {}",
            self.program,
            names.len(),
            dir.display()
        );

        let output = Command::new(&self.program)
            .arg("--")
            .args(names)
            .current_dir(dir)
            .output()
            .map_err(|source| ChecksumError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ChecksumError::ExternalFailure {
                program: self.program.clone(),
                dir: dir.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let digests = Manifest::parse(&output.stdout);

        Ok(DigestBatch {
            raw: output.stdout,
            digests,
        })
    }
}

pub struct FileChecksum {
    /// Hex encoded.
    pub md5: String,
}

/// Hashes one file in 64 KiB chunks.
///
/// The modification time is compared before and after reading; a change
/// fails with `ChecksumError::ConcurrentModification`. An unchanged mtime
/// does not prove the file was left alone.
pub fn checksum_file(path: &Path) -> Result<FileChecksum, ChecksumError> {
    info!("Checksumming {}", path.display());

    let metadata_before = std::fs::metadata(path).map_err(|e| io_error(e, path))?;
    let mtime_before = metadata_before.modified().map_err(ChecksumError::Io)?;

    let mut file = File::open(path).map_err(|e| io_error(e, path))?;
    let mut context = md5::Context::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(ChecksumError::Io)?;
        if bytes_read == 0 {
            break;
        }
        context.consume(&buffer[..bytes_read]);
    }

    let metadata_after = std::fs::metadata(path).map_err(ChecksumError::Io)?;
    let mtime_after = metadata_after.modified().map_err(ChecksumError::Io)?;

    if mtime_before != mtime_after {
        return Err(ChecksumError::ConcurrentModification(path.to_path_buf()));
    }

    let md5 = format!("{:x}", context.compute());

    debug!("Checksum of {} is {}", path.display(), md5);

    Ok(FileChecksum { md5 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_checksum_simple_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"Hello, world!").unwrap();
        temp_file.flush().unwrap();

        let result = checksum_file(temp_file.path()).unwrap();

        assert_eq!(result.md5, "6cd3556deb0da54bca060b4c39479839");
    }

    #[test]
    fn test_checksum_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();

        let result = checksum_file(temp_file.path()).unwrap();

        assert_eq!(result.md5, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_checksum_spans_multiple_reads() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&vec![b'A'; 200 * 1024]).unwrap();
        temp_file.flush().unwrap();

        let result = checksum_file(temp_file.path()).unwrap();

        assert_eq!(
            result.md5,
            format!("{:x}", md5::compute(vec![b'A'; 200 * 1024]))
        );
    }

    #[test]
    fn test_checksum_nonexistent_file() {
        match checksum_file(Path::new("/nonexistent/file.txt")) {
            Err(ChecksumError::Io(_)) => {}
            _ => panic!("Expected IO error for nonexistent file"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_checksum_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();
        temp_file.flush().unwrap();

        let mut perms = fs::metadata(temp_file.path()).unwrap().permissions();
        perms.set_mode(0o000);
        fs::set_permissions(temp_file.path(), perms).unwrap();

        // Privileged users can read the file regardless of its mode.
        if fs::read(temp_file.path()).is_ok() {
            return;
        }

        match checksum_file(temp_file.path()) {
            Err(ChecksumError::PermissionDenied(_)) => {}
            _ => panic!("Expected PermissionDenied error for permission denied"),
        }
    }

    #[test]
    fn test_md5_hasher_batch_matches_md5sum_format() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();

        let batch = Md5Hasher
            .compute_digests(temp.path(), &names(&["a.txt", "b.txt"]))
            .unwrap();

        assert_eq!(
            String::from_utf8(batch.raw.clone()).unwrap(),
            "0cc175b9c0f1b6a831c399e269772661  a.txt\n\
             92eb5ffee6ae2fec3ad71c777531578f  b.txt\n"
        );
        assert_eq!(batch.digests.entries["a.txt"], "0cc175b9c0f1b6a831c399e269772661");
        assert_eq!(Manifest::parse(&batch.raw), batch.digests);
    }

    #[test]
    fn test_md5_hasher_fails_on_missing_file() {
        let temp = TempDir::new().unwrap();

        let result = Md5Hasher.compute_digests(temp.path(), &names(&["gone.txt"]));

        assert!(matches!(result, Err(ChecksumError::Io(_))));
    }

    #[test]
    fn test_external_hasher_missing_program() {
        let temp = TempDir::new().unwrap();
        let hasher = ExternalHasher {
            program: "definitely-not-a-real-hash-program".to_string(),
        };

        let result = hasher.compute_digests(temp.path(), &names(&["a.txt"]));

        assert!(matches!(result, Err(ChecksumError::Spawn { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_external_hasher_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let hasher = ExternalHasher {
            program: "false".to_string(),
        };

        let result = hasher.compute_digests(temp.path(), &names(&["a.txt"]));

        assert!(matches!(result, Err(ChecksumError::ExternalFailure { .. })));
    }

    #[test]
    fn test_external_hasher_agrees_with_in_process() {
        if Command::new("md5sum").arg("--version").output().is_err() {
            return;
        }

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("with space.txt"), "spaced").unwrap();
        let files = names(&["a.txt", "with space.txt"]);

        let external = ExternalHasher {
            program: "md5sum".to_string(),
        }
        .compute_digests(temp.path(), &files)
        .unwrap();
        let internal = Md5Hasher.compute_digests(temp.path(), &files).unwrap();

        assert_eq!(external.digests, internal.digests);
    }
}
