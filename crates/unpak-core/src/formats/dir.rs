//! A plain directory tree used as an archive source.

use std::fs::File;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use crate::ExtractionError;
use crate::Result;
use crate::formats::compression::CompressionCodec;
use crate::formats::entry::ArchiveEntry;
use crate::formats::entry::Chunk;
use crate::formats::entry::PackHints;
use crate::formats::traits::ArchiveSource;
use crate::manifest::HINTS_FILE_NAME;
use crate::manifest::IGNORE_FILE_NAME;

/// Chunk size used to split directory files.
pub const DIR_CHUNK_SIZE: u64 = 1024 * 1024;

/// Regular files under a directory, presented as stored chunks.
///
/// Entries are listed in file-name order, depth first. Symlinks and other
/// non-regular files are skipped, as are the sidecar manifests at the root.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    entries: Vec<ArchiveEntry>,
}

impl DirectorySource {
    /// Walks `root` and records every regular file.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked or contains a file
    /// name that is not valid UTF-8.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut entries = Vec::new();
        for item in WalkDir::new(root).sort_by_file_name() {
            let item = item.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                ExtractionError::fs("walk directory", path, e.into())
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            let path = relative_slash_path(root, item.path())?;
            if path == HINTS_FILE_NAME || path == IGNORE_FILE_NAME {
                continue;
            }
            let len = item
                .metadata()
                .map_err(|e| ExtractionError::fs("stat", item.path(), e.into()))?
                .len();
            entries.push(ArchiveEntry {
                path,
                hints: PackHints::default(),
                chunks: split_chunks(len),
            });
        }
        debug!(root = %root.display(), entries = entries.len(), "listed directory source");
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// The directory being read.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveSource for DirectorySource {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_chunk(&self, entry: usize, chunk: usize) -> Result<Vec<u8>> {
        let entry = self.entries.get(entry).ok_or_else(|| {
            ExtractionError::InvalidArchive(format!("entry index {entry} out of range"))
        })?;
        let info = entry.chunks.get(chunk).ok_or_else(|| {
            ExtractionError::InvalidArchive(format!("{}: chunk {chunk} out of range", entry.path))
        })?;

        let path = self.root.join(entry.relative_path());
        let mut file = File::open(&path).map_err(|e| ExtractionError::fs("open", &path, e))?;
        file.seek(SeekFrom::Start(info.offset))?;
        let mut data = Vec::new();
        file.take(info.uncompressed_size).read_to_end(&mut data)?;
        if data.len() as u64 != info.uncompressed_size {
            return Err(ExtractionError::InvalidArchive(format!(
                "{}: file shrank while reading",
                entry.path
            )));
        }
        Ok(data)
    }

    fn format_name(&self) -> &str {
        "directory"
    }
}

fn relative_slash_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ExtractionError::InvalidArchive(format!("{} escapes root", path.display())))?;
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            ExtractionError::InvalidArchive(format!("{} is not valid UTF-8", path.display()))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn split_chunks(len: u64) -> Vec<Chunk> {
    (0..len.div_ceil(DIR_CHUNK_SIZE))
        .map(|i| {
            let offset = i * DIR_CHUNK_SIZE;
            let size = DIR_CHUNK_SIZE.min(len - offset);
            Chunk {
                offset,
                compressed_size: size,
                uncompressed_size: size,
                codec: CompressionCodec::Stored,
                crc32: None,
            }
        })
        .collect()
}
