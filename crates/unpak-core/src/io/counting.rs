//! Byte-counting writer that forwards progress.

use std::io::Write;

use crate::ProgressCallback;

/// Wraps a writer, counting the bytes it accepts and reporting each
/// successful write to a [`ProgressCallback`].
///
/// Only bytes the inner writer accepted are counted.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use unpak_core::NoopProgress;
/// use unpak_core::io::CountingWriter;
///
/// let mut progress = NoopProgress;
/// let mut buffer = Vec::new();
/// let mut writer = CountingWriter::new(&mut buffer, &mut progress);
/// writer.write_all(b"Hello, ")?;
/// writer.write_all(b"World!")?;
/// assert_eq!(writer.total_bytes(), 13);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct CountingWriter<'p, W> {
    inner: W,
    bytes_written: u64,
    progress: &'p mut dyn ProgressCallback,
}

impl<'p, W> CountingWriter<'p, W> {
    /// Creates a new counting writer.
    pub fn new(inner: W, progress: &'p mut dyn ProgressCallback) -> Self {
        Self {
            inner,
            bytes_written: 0,
            progress,
        }
    }

    /// Returns the total number of bytes successfully written.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.bytes_written
    }

    /// Returns a reference to the inner writer.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consumes the wrapper and returns the inner writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn record(&mut self, bytes: usize) {
        if bytes > 0 {
            self.bytes_written += bytes as u64;
            self.progress.on_bytes_written(bytes as u64);
        }
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.record(bytes);
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(buf)?;
        self.record(buf.len());
        Ok(())
    }
}
