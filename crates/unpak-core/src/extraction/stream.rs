//! Ordered, optionally parallel chunk decoding for one entry.

use std::collections::VecDeque;
use std::io;
use std::io::Read;
use std::sync::Arc;
use std::sync::mpsc;

use rayon::ThreadPool;
use tracing::debug;

use crate::ExtractionError;
use crate::Result;
use crate::formats::ArchiveSource;

type Pending = mpsc::Receiver<Result<Vec<u8>>>;

/// Where chunks decoded ahead of the read cursor run.
#[derive(Debug, Clone, Default)]
pub enum DecodePool {
    /// Nowhere: every chunk is decoded on the reading thread.
    #[default]
    Inline,
    /// A pool owned by the caller.
    Dedicated(Arc<ThreadPool>),
    /// rayon's process-wide pool.
    Global,
}

impl DecodePool {
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Inline => job(),
            Self::Dedicated(pool) => pool.spawn_fifo(job),
            Self::Global => rayon::spawn_fifo(job),
        }
    }

    fn is_inline(&self) -> bool {
        matches!(self, Self::Inline)
    }
}

/// Delivers an entry's decoded bytes in chunk order.
///
/// With a budget of `0` (or [`DecodePool::Inline`]) each chunk is decoded on the calling
/// thread when the previous one has been consumed. With a budget `N > 0` up
/// to `N` chunks are decoded ahead of the read cursor on the pool; they may
/// finish in any order but are handed out strictly in sequence.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use std::sync::Arc;
/// use unpak_core::extraction::{ChunkReader, DecodePool};
/// use unpak_core::formats::{ArchiveSource, DirectorySource};
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("f"), b"abcdefgh")?;
///
/// let source: Arc<dyn ArchiveSource> = Arc::new(DirectorySource::open(dir.path())?);
/// let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build()?);
/// let mut reader = ChunkReader::open(source, 0, 2, DecodePool::Dedicated(pool))?;
/// let mut out = String::new();
/// reader.read_to_string(&mut out)?;
/// assert_eq!(out, "abcdefgh");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ChunkReader {
    source: Arc<dyn ArchiveSource>,
    entry: usize,
    chunk_count: usize,
    next_chunk: usize,
    ahead: usize,
    pool: DecodePool,
    pending: VecDeque<Pending>,
    current: Vec<u8>,
    pos: usize,
}

impl ChunkReader {
    /// Opens entry `entry` of `source` with a decode-ahead budget of
    /// `parallelism` chunks.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidArchive`] if `entry` is out of range.
    pub fn open(
        source: Arc<dyn ArchiveSource>,
        entry: usize,
        parallelism: usize,
        pool: DecodePool,
    ) -> Result<Self> {
        let chunk_count = source
            .entries()
            .get(entry)
            .map(|e| e.chunks.len())
            .ok_or_else(|| ExtractionError::InvalidArchive(format!("no entry {entry}")))?;
        let pool = if parallelism == 0 {
            DecodePool::Inline
        } else {
            pool
        };
        debug!(
            entry,
            chunks = chunk_count,
            ahead = if pool.is_inline() { 0 } else { parallelism },
            pool = ?pool,
            "opening chunk reader"
        );
        let mut reader = Self {
            source,
            entry,
            chunk_count,
            next_chunk: 0,
            ahead: parallelism,
            pool,
            pending: VecDeque::with_capacity(parallelism.min(chunk_count)),
            current: Vec::new(),
            pos: 0,
        };
        reader.schedule();
        Ok(reader)
    }

    /// Returns the next decoded chunk, or `None` after the last one.
    ///
    /// # Errors
    ///
    /// Returns whatever the source reported for the chunk.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.pool.is_inline() {
            if self.next_chunk == self.chunk_count {
                return Ok(None);
            }
            let index = self.next_chunk;
            self.next_chunk += 1;
            return self.source.read_chunk(self.entry, index).map(Some);
        }

        let Some(rx) = self.pending.pop_front() else {
            return Ok(None);
        };
        let data = rx.recv().map_err(|_| {
            ExtractionError::Io(io::Error::other("chunk decoder exited without a result"))
        })??;
        self.schedule();
        Ok(Some(data))
    }

    /// Keeps up to `ahead` decodes in flight.
    fn schedule(&mut self) {
        if self.pool.is_inline() {
            return;
        }
        while self.pending.len() < self.ahead && self.next_chunk < self.chunk_count {
            let (tx, rx) = mpsc::sync_channel(1);
            let source = Arc::clone(&self.source);
            let (entry, chunk) = (self.entry, self.next_chunk);
            self.pool.spawn(move || {
                // The reader may have been dropped after an earlier failure.
                let _ = tx.send(source.read_chunk(entry, chunk));
            });
            self.pending.push_back(rx);
            self.next_chunk += 1;
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.current.len() {
            match self.next_chunk().map_err(io::Error::other)? {
                Some(chunk) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len() - self.pos);
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
