//! Atomic file placement.
//!
//! Files are staged as hidden temp files directly inside the output root, so
//! the final link or rename never crosses a filesystem boundary, then moved
//! into place without replacing anything.

use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::ExtractionError;
use crate::Result;

/// Name prefix of staging files in the output root.
pub const TEMP_PREFIX: &str = ".unpak";

/// Writes a file at `dest` through a temp file in `root`.
///
/// `fill` receives a buffered writer over the temp file. If `fill`, the
/// final flush, or the move fails, the temp file is removed and `dest` is
/// left untouched. A failure to remove the temp file is logged and the
/// original error is returned.
///
/// # Errors
///
/// Returns the error from `fill`, a [`ExtractionError::Filesystem`] error for
/// temp-file creation or writing, or [`ExtractionError::DestinationExists`]
/// if something already occupies `dest`.
pub fn write_atomic<T, F>(root: &Path, dest: &Path, fill: F) -> Result<T>
where
    F: FnOnce(&mut dyn Write) -> Result<T>,
{
    let tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(root)
        .map_err(|e| ExtractionError::fs("create temp file in", root, e))?;

    match stage(tmp, fill) {
        Ok((tmp, value)) => match tmp.persist_noclobber(dest) {
            Ok(_) => Ok(value),
            Err(e) => {
                let err = if e.error.kind() == io::ErrorKind::AlreadyExists {
                    ExtractionError::DestinationExists {
                        path: dest.to_path_buf(),
                    }
                } else {
                    ExtractionError::fs("rename temp file to", dest, e.error)
                };
                discard(e.file);
                Err(err)
            }
        },
        Err((tmp, err)) => {
            discard(tmp);
            Err(err)
        }
    }
}

type Staged<T> = std::result::Result<(NamedTempFile, T), (NamedTempFile, ExtractionError)>;

fn stage<T, F>(tmp: NamedTempFile, fill: F) -> Staged<T>
where
    F: FnOnce(&mut dyn Write) -> Result<T>,
{
    let path = tmp.path().to_path_buf();
    let mut writer = BufWriter::new(tmp);
    let value = match fill(&mut writer) {
        Ok(value) => value,
        Err(err) => {
            return Err(match writer.into_inner() {
                Ok(tmp) => (tmp, err),
                Err(e) => (e.into_inner().into_parts().0, err),
            });
        }
    };
    let tmp = match writer.into_inner() {
        Ok(tmp) => tmp,
        Err(e) => {
            let (error, writer) = e.into_parts();
            return Err((
                writer.into_parts().0,
                ExtractionError::fs("write temp file", path, error),
            ));
        }
    };
    if let Err(e) = tmp.as_file().sync_all() {
        return Err((tmp, ExtractionError::fs("write temp file", path, e)));
    }
    Ok((tmp, value))
}

fn discard(tmp: NamedTempFile) {
    let path = tmp.path().to_path_buf();
    if let Err(e) = tmp.close() {
        warn!(path = %path.display(), error = %e, "failed to remove temp file");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn leftovers(root: &Path) -> Vec<String> {
        fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(TEMP_PREFIX))
            .collect()
    }

    #[test]
    fn test_write_atomic_success() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("out.txt");
        let n = write_atomic(root.path(), &dest, |w| {
            w.write_all(b"hello")?;
            Ok(5)
        })
        .unwrap();
        assert_eq!(n, 5);
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
        assert!(leftovers(root.path()).is_empty());
    }

    #[test]
    fn test_write_atomic_failure_removes_temp() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("out.txt");
        let err = write_atomic(root.path(), &dest, |w| {
            w.write_all(b"partial")?;
            Err::<(), _>(ExtractionError::InvalidArchive("boom".into()))
        })
        .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(_)));
        assert!(!dest.exists());
        assert!(leftovers(root.path()).is_empty());
    }

    #[test]
    fn test_write_atomic_never_replaces() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("out.txt");
        fs::write(&dest, b"original").unwrap();
        let err = write_atomic(root.path(), &dest, |w| {
            w.write_all(b"new")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ExtractionError::DestinationExists { .. }));
        assert_eq!(fs::read(&dest).unwrap(), b"original");
        assert!(leftovers(root.path()).is_empty());
    }

    #[test]
    fn test_write_atomic_into_subdirectory() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("sub")).unwrap();
        let dest = root.path().join("sub").join("f");
        write_atomic(root.path(), &dest, |w| Ok(w.write_all(b"x")?)).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"x");
        assert!(leftovers(root.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_failure_keeps_original_error() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let dest = root.path().join("out.txt");
        let set_mode = |mode| {
            fs::set_permissions(root.path(), fs::Permissions::from_mode(mode)).unwrap();
        };
        let err = write_atomic(root.path(), &dest, |w| {
            w.write_all(b"partial")?;
            // The temp file can no longer be unlinked from a read-only root.
            set_mode(0o555);
            Err::<(), _>(ExtractionError::InvalidArchive("boom".into()))
        })
        .unwrap_err();
        set_mode(0o755);

        assert!(matches!(err, ExtractionError::InvalidArchive(ref m) if m == "boom"), "{err}");
        assert!(!dest.exists());
        // Privileged users bypass the mode bits, in which case removal succeeds.
        assert!(leftovers(root.path()).len() <= 1);
    }

    #[test]
    fn test_write_atomic_missing_root() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");
        let err = write_atomic(&missing, &missing.join("f"), |_| Ok(())).unwrap_err();
        assert!(matches!(err, ExtractionError::Filesystem { .. }));
    }
}
