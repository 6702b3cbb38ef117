//! Destinations for finished log lines.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::Level;

/// Receives one finished JSON line per emitted record.
///
/// Implementations must be safe for concurrent writers when the host
/// environment is concurrent; the emitter performs no write-serialization
/// of its own. Writes are append-only and line-oriented: the emitter
/// passes the line without a trailing newline and expects the sink to
/// write it as exactly one line.
pub trait Sink: Send + Sync {
    /// Writes `line` to the channel for `level`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying destination. The emitter
    /// reports the error on stderr and drops the line; it never retries or
    /// buffers.
    fn write(&self, level: Level, line: &str) -> io::Result<()>;

    /// Flushes buffered lines, if the destination buffers at all.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying destination.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes every line to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write(&self, _level: Level, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{line}")
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

/// Writes every line to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn write(&self, _level: Level, line: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{line}")
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().lock().flush()
    }
}

/// Serializes writes to an arbitrary [`Write`] destination behind a mutex.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: Mutex<W>,
}

impl<W> WriterSink<W>
where
    W: Write + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }
}

impl<W> Sink for WriterSink<W>
where
    W: Write + Send,
{
    fn write(&self, _level: Level, line: &str) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")
    }

    fn flush(&self) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()
    }
}

/// Captures lines in memory for tests and other adversarial environments.
///
/// Cloning shares the underlying buffer, so keep a clone and hand the
/// original to the logger:
///
/// ```
/// use jsonline_logger::{Logger, MemorySink};
///
/// let sink = MemorySink::default();
/// let logger = Logger::new(sink.clone());
/// logger.info("captured");
/// assert_eq!(sink.lines().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines, in emission order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// All captured `(level, line)` pairs, in emission order.
    #[must_use]
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sink for MemorySink {
    fn write(&self, level: Level, line: &str) -> io::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, line.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{MemorySink, Sink, WriterSink};
    use crate::Level;

    #[test]
    fn memory_sink_records_level_and_line() {
        let sink = MemorySink::new();
        sink.write(Level::Warn, "one").unwrap();
        sink.write(Level::Info, "two").unwrap();
        assert_eq!(sink.lines(), vec!["one", "two"]);
        assert_eq!(
            sink.entries(),
            vec![(Level::Warn, "one".to_owned()), (Level::Info, "two".to_owned())]
        );
    }

    #[test]
    fn memory_sink_clones_share_the_buffer() {
        let sink = MemorySink::new();
        let observer = sink.clone();
        sink.write(Level::Info, "shared").unwrap();
        assert_eq!(observer.lines(), vec!["shared"]);
    }

    #[test]
    fn writer_sink_appends_newline_per_line() {
        let sink = WriterSink::new(Vec::new());
        sink.write(Level::Info, "a").unwrap();
        sink.write(Level::Info, "b").unwrap();
        let written = sink.inner.into_inner().unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "a\nb\n");
    }
}
