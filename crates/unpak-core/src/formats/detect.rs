//! Archive source detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::ExtractionError;
use crate::Result;
use crate::formats::dir::DirectorySource;
use crate::formats::pak::PAK_MAGIC;
use crate::formats::pak::PakArchive;
use crate::formats::traits::ArchiveSource;

/// Supported source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A directory tree.
    Directory,
    /// A pak archive file.
    Pak,
}

/// Detects the source kind by inspecting the filesystem, not the extension.
///
/// # Errors
///
/// Returns an I/O error if `path` cannot be inspected and
/// [`ExtractionError::UnsupportedFormat`] if it is neither a directory nor a
/// file starting with the pak signature.
pub fn detect_source(path: &Path) -> Result<SourceKind> {
    let meta = path
        .metadata()
        .map_err(|e| ExtractionError::fs("inspect source", path, e))?;
    if meta.is_dir() {
        return Ok(SourceKind::Directory);
    }

    let mut magic = [0u8; 4];
    let mut file = File::open(path).map_err(|e| ExtractionError::fs("open source", path, e))?;
    match file.read_exact(&mut magic) {
        Ok(()) if magic == PAK_MAGIC => Ok(SourceKind::Pak),
        Ok(()) => Err(ExtractionError::UnsupportedFormat),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ExtractionError::UnsupportedFormat)
        }
        Err(e) => Err(ExtractionError::fs("read source", path, e)),
    }
}

/// Opens `path` as whichever source kind it is.
///
/// # Errors
///
/// See [`detect_source`], plus any error from opening the source itself.
pub fn open_source(path: &Path) -> Result<Arc<dyn ArchiveSource>> {
    let source: Arc<dyn ArchiveSource> = match detect_source(path)? {
        SourceKind::Directory => Arc::new(DirectorySource::open(path)?),
        SourceKind::Pak => Arc::new(PakArchive::open(path)?),
    };
    Ok(source)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::PakBuilder;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_directory() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_source(temp.path()).unwrap(), SourceKind::Directory);
        assert_eq!(open_source(temp.path()).unwrap().format_name(), "directory");
    }

    #[test]
    fn test_detect_pak_by_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        fs::write(&path, PakBuilder::new().add_file("a", b"a").build()).unwrap();
        assert_eq!(detect_source(&path).unwrap(), SourceKind::Pak);
        assert_eq!(open_source(&path).unwrap().entries().len(), 1);
    }

    #[test]
    fn test_detect_unknown() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("archive.pak");
        fs::write(&path, b"PK\x03\x04 not ours").unwrap();
        assert!(matches!(detect_source(&path), Err(ExtractionError::UnsupportedFormat)));

        let short = temp.path().join("short");
        fs::write(&short, b"UP").unwrap();
        assert!(matches!(detect_source(&short), Err(ExtractionError::UnsupportedFormat)));
    }

    #[test]
    fn test_detect_missing() {
        let temp = TempDir::new().unwrap();
        let err = detect_source(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, ExtractionError::Filesystem { .. }));
    }
}
