//! # Overview
//!
//! A structured logger for server applications: every record is one
//! single-line JSON object, enriched with scope-local contextual fields,
//! optionally timed around a caller-supplied unit of work, and scrubbed of
//! configured sensitive field names before it reaches a sink.
//!
//! - Leveled entry points emit records immediately; the `*_timed` variants
//!   bracket a unit of work, capture its duration and any error it returns,
//!   and hand the result back unchanged.
//! - A [`LogContext`] scope (typically one inbound request) contributes its
//!   fields to every record emitted while the scope is live, across threads
//!   and `.await` points ([`FutureExt::in_scope`]).
//! - Sensitive values are masked wherever they appear: nested record
//!   fields, JSON-encoded string payloads, and XML-tag-delimited string
//!   payloads ([`SensitiveKeys`]).
//!
//! ## Basic example
//!
//! ```
//! use jsonline_logger::{Level, LogContext, Logger, MemorySink};
//!
//! let sink = MemorySink::default();
//! let logger = Logger::new(sink.clone())
//!     .min_level(Level::Info)
//!     .sensitive_keys(["password"]);
//!
//! let _guard = LogContext::new().record("request_id", "req-123").enter();
//! logger.info("processing request");
//!
//! let line = &sink.lines()[0];
//! assert!(line.contains(r#""msg":"processing request""#));
//! assert!(line.contains(r#""request_id":"req-123""#));
//! ```
//!
//! ## Timing a unit of work
//!
//! ```
//! use jsonline_logger::{Logger, MemorySink};
//!
//! let sink = MemorySink::default();
//! let logger = Logger::new(sink.clone());
//!
//! let outcome: Result<u32, std::convert::Infallible> =
//!     logger.info_timed("charge card", || Ok(42));
//! assert_eq!(outcome.unwrap(), 42);
//!
//! let line = &sink.lines()[0];
//! assert!(line.contains(r#""start_time""#));
//! assert!(line.contains(r#""duration""#));
//! ```
//!
//! ## Routing the `log` macros
//!
//! Installing the logger globally registers it as the [`log`] backend, so
//! the standard macros route through the same pipeline, structured
//! key/values included:
//!
//! ```
//! let sink = jsonline_logger::MemorySink::default();
//! jsonline_logger::try_init(jsonline_logger::Logger::new(sink.clone())).unwrap();
//!
//! log::info!(order_id = 7; "order placed");
//! assert!(sink.lines()[0].contains(r#""order_id":7"#));
//! ```

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use serde_json::{Map, Value};

use self::{emitter::Emitter, event::ExceptionDetail};
pub use self::{
    context::LogContext,
    event::Event,
    filter::{MASK, SensitiveKeys},
    future::FutureExt,
    guard::ScopeGuard,
    level::Level,
    record::Record,
    request::RequestInfo,
    sink::{MemorySink, Sink, StderrSink, StdoutSink, WriterSink},
    timestamp::{Clock, ManualClock, SystemClock, TimestampFormatter},
    value::ContextValue,
};
pub use chrono_tz::Tz;

mod context;
mod emitter;
mod event;
mod filter;
pub mod future;
pub mod guard;
mod level;
mod record;
pub mod request;
pub mod sink;
mod stack;
mod timestamp;
mod value;

type StaticCowStr = Cow<'static, str>;

const DEFAULT_BACKTRACE_LIMIT: usize = 128;

/// Errors from installing the process-wide logger.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("failed to register as the `log` backend")]
    SetLogger(#[from] log::SetLoggerError),
}

/// A leveled structured logger writing one JSON object per line.
///
/// Every record carries `msg`, `log_timestamp` and `log_level`, followed by
/// this logger's default fields, the live [`LogContext`] snapshot, and the
/// caller's own fields; later entries win on key collision. The `*_timed`
/// entry points additionally run a unit of work and stamp `start_time`,
/// `end_time`, `duration` and, on failure, the error detail into the same
/// record.
///
/// Configuration happens at construction time through chained builder
/// methods; afterwards the logger is immutable and freely shareable across
/// threads (the sink must tolerate concurrent writers).
///
/// # Example
///
/// ```
/// use jsonline_logger::{Level, Logger, MemorySink};
///
/// let sink = MemorySink::default();
/// let logger = Logger::new(sink.clone())
///     .min_level(Level::Info)
///     .sensitive_keys(["password", "session_token"])
///     .default_record("service", "api");
///
/// logger.debug("not emitted");
/// logger.info("emitted");
/// assert_eq!(sink.lines().len(), 1);
/// ```
pub struct Logger {
    emitter: Emitter,
    formatter: TimestampFormatter,
    clock: Arc<dyn Clock>,
    min_level: Level,
    backtrace_limit: usize,
    default_fields: Vec<(StaticCowStr, Value)>,
}

impl Logger {
    /// Creates a logger writing to the given sink, with no sensitive keys,
    /// a `debug` severity floor, and timestamps in the host's timezone.
    pub fn new<S>(sink: S) -> Self
    where
        S: Sink + 'static,
    {
        Self {
            emitter: Emitter::new(Box::new(sink)),
            formatter: TimestampFormatter::default(),
            clock: Arc::new(SystemClock),
            min_level: Level::Debug,
            backtrace_limit: DEFAULT_BACKTRACE_LIMIT,
            default_fields: Vec::new(),
        }
    }

    /// Sets the field names to redact, replacing any previous set.
    ///
    /// Matching is case-insensitive and applies to nested fields, JSON
    /// string payloads and XML-tag payloads alike. See [`SensitiveKeys`].
    #[must_use]
    pub fn sensitive_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.emitter.set_keys(SensitiveKeys::new(keys));
        self
    }

    /// Sets the severity floor. Records below it are not built or emitted;
    /// a timed unit of work still runs and its result is still returned.
    #[must_use]
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the fixed timezone used for `log_timestamp`, `start_time` and
    /// `end_time`.
    #[must_use]
    pub fn timezone(mut self, zone: Tz) -> Self {
        self.formatter = TimestampFormatter::new(zone);
        self
    }

    /// Replaces the clock. Production code keeps the default
    /// [`SystemClock`]; tests freeze time with a [`ManualClock`].
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Caps `exception_backtrace` at the first `limit` frames.
    #[must_use]
    pub fn backtrace_limit(mut self, limit: usize) -> Self {
        self.backtrace_limit = limit;
        self
    }

    /// Adds a constant field stamped into every record, between the level
    /// and the context snapshot. Context and caller fields win on key
    /// collision.
    #[must_use]
    pub fn default_record(
        mut self,
        key: impl Into<StaticCowStr>,
        value: impl Into<ContextValue>,
    ) -> Self {
        self.default_fields
            .push((key.into(), value.into().to_json()));
        self
    }

    /// Emits one record at the given level.
    pub fn log(&self, level: Level, event: impl Into<Event>) {
        if level < self.min_level {
            return;
        }
        let record = self.build_record(level, event.into());
        self.emitter.emit(level, record);
    }

    pub fn debug(&self, event: impl Into<Event>) {
        self.log(Level::Debug, event);
    }

    pub fn info(&self, event: impl Into<Event>) {
        self.log(Level::Info, event);
    }

    pub fn warn(&self, event: impl Into<Event>) {
        self.log(Level::Warn, event);
    }

    pub fn error(&self, event: impl Into<Event>) {
        self.log(Level::Error, event);
    }

    /// Runs `work` synchronously on the calling thread, emits one record
    /// covering it, and hands its result back unchanged.
    ///
    /// The record gains `start_time`, `end_time` and `duration` (fractional
    /// seconds) around the unit of work. When `work` fails, the error's
    /// detail is stamped into the record (overwriting `msg` only if none
    /// was supplied) and the original error is returned unchanged *after*
    /// emission; it is never swallowed or converted.
    ///
    /// # Errors
    ///
    /// Exactly the errors `work` itself returns.
    pub fn log_timed<T, E, F>(
        &self,
        level: Level,
        event: impl Into<Event>,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        if level < self.min_level {
            return work();
        }

        let mut record = self.build_record(level, event.into());
        let start = self.clock.now();
        record.insert("start_time", self.formatter.format(start));

        let outcome = work();

        let end = self.clock.now();
        if let Err(error) = &outcome {
            self.attach_exception(&mut record, &ExceptionDetail::capture(error));
        }
        record.insert("end_time", self.formatter.format(end));
        record.insert("duration", (end - start).as_seconds_f64());
        self.emitter.emit(level, record);

        outcome
    }

    /// [`log_timed`](Logger::log_timed) at debug level.
    ///
    /// # Errors
    ///
    /// Exactly the errors `work` itself returns.
    pub fn debug_timed<T, E, F>(&self, event: impl Into<Event>, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        self.log_timed(Level::Debug, event, work)
    }

    /// [`log_timed`](Logger::log_timed) at info level.
    ///
    /// # Errors
    ///
    /// Exactly the errors `work` itself returns.
    pub fn info_timed<T, E, F>(&self, event: impl Into<Event>, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        self.log_timed(Level::Info, event, work)
    }

    /// [`log_timed`](Logger::log_timed) at warn level.
    ///
    /// # Errors
    ///
    /// Exactly the errors `work` itself returns.
    pub fn warn_timed<T, E, F>(&self, event: impl Into<Event>, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        self.log_timed(Level::Warn, event, work)
    }

    /// [`log_timed`](Logger::log_timed) at error level.
    ///
    /// # Errors
    ///
    /// Exactly the errors `work` itself returns.
    pub fn error_timed<T, E, F>(&self, event: impl Into<Event>, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        self.log_timed(Level::Error, event, work)
    }

    /// Flushes the sink, if it buffers.
    pub fn flush(&self) {
        self.emitter.flush();
    }

    fn build_record(&self, level: Level, event: Event) -> Record {
        let Event {
            msg,
            fields,
            exception,
        } = event;

        let mut record = Record::new();
        record.insert("msg", msg.unwrap_or(Value::Null));
        record.insert("log_timestamp", self.formatter.format(self.clock.now()));
        record.insert("log_level", level.as_str());
        for (key, value) in &self.default_fields {
            record.insert(key.clone(), value.clone());
        }
        match LogContext::current() {
            Value::Object(context) => record.merge(context),
            Value::Null => {}
            // The scope was replaced with a non-map value; nest it instead
            // of failing, mirroring the store's own wrap policy.
            other => record.insert("data", other),
        }
        record.merge(fields);
        if let Some(detail) = exception {
            self.attach_exception(&mut record, &detail);
        }
        record
    }

    fn attach_exception(&self, record: &mut Record, detail: &ExceptionDetail) {
        record.insert("exception_class", detail.class.clone());
        record.insert("exception_message", detail.message.clone());
        if let Some(backtrace) = detail.backtrace_frames(self.backtrace_limit) {
            record.insert("exception_backtrace", backtrace);
        }
        if record.msg_is_unset() {
            record.insert("msg", detail.message.clone());
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

/// Lets a host that speaks the [`log`] ecosystem use this logger as its
/// backend: the formatted message becomes `msg` and the record's
/// structured key/values become caller fields.
impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        Level::from(metadata.level()) >= self.min_level
    }

    fn log(&self, record: &log::Record<'_>) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }
        let mut collector = FieldCollector::default();
        if let Err(err) = record.key_values().visit(&mut collector) {
            eprintln!("failed to read log key/values: {err}");
        }
        let mut event = Event::message(record.args().to_string());
        event.fields = collector.0;
        self.log(Level::from(record.level()), event);
    }

    fn flush(&self) {
        self.emitter.flush();
    }
}

#[derive(Default)]
struct FieldCollector(Map<String, Value>);

impl<'kvs> log::kv::VisitSource<'kvs> for FieldCollector {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        let value = serde_json::to_value(&value).unwrap_or(Value::Null);
        self.0.insert(key.as_str().to_owned(), value);
        Ok(())
    }
}

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();
static LOG_BRIDGE: LogBridge = LogBridge;

// Forwards the `log` macros to the installed logger. Registered once by
// `try_init`; a no-op until the `OnceLock` is populated.
struct LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        global().is_some_and(|logger| log::Log::enabled(logger, metadata))
    }

    fn log(&self, record: &log::Record<'_>) {
        if let Some(logger) = global() {
            log::Log::log(logger, record);
        }
    }

    fn flush(&self) {
        if let Some(logger) = global() {
            logger.flush();
        }
    }
}

/// Installs `logger` as the process-wide logger and registers it as the
/// [`log`] backend.
///
/// This should be called early in the execution of a Rust program; records
/// logged through the crate-level functions before initialization are
/// dropped.
///
/// # Errors
///
/// Returns an error if a logger has already been installed, either through
/// this crate or directly with [`log::set_logger`].
pub fn try_init(logger: Logger) -> Result<(), Error> {
    let filter = logger.min_level.to_level_filter();
    GLOBAL_LOGGER
        .set(logger)
        .map_err(|_| Error::AlreadyInitialized)?;
    log::set_logger(&LOG_BRIDGE)?;
    log::set_max_level(filter);
    Ok(())
}

/// Installs `logger` as the process-wide logger.
///
/// # Panics
///
/// Panics if a logger has already been installed. Use [`try_init`] to
/// handle that case.
pub fn init(logger: Logger) {
    try_init(logger).expect("jsonline_logger::init should not be called after initialization");
}

/// The installed process-wide logger, if any.
#[must_use]
pub fn global() -> Option<&'static Logger> {
    GLOBAL_LOGGER.get()
}

/// Logs through the installed logger at debug level; a no-op before
/// [`init`](init()).
pub fn debug(event: impl Into<Event>) {
    if let Some(logger) = global() {
        logger.debug(event);
    }
}

/// Logs through the installed logger at info level; a no-op before
/// [`init`](init()).
pub fn info(event: impl Into<Event>) {
    if let Some(logger) = global() {
        logger.info(event);
    }
}

/// Logs through the installed logger at warn level; a no-op before
/// [`init`](init()).
pub fn warn(event: impl Into<Event>) {
    if let Some(logger) = global() {
        logger.warn(event);
    }
}

/// Logs through the installed logger at error level; a no-op before
/// [`init`](init()).
pub fn error(event: impl Into<Event>) {
    if let Some(logger) = global() {
        logger.error(event);
    }
}

/// [`Logger::log_timed`] through the installed logger. Before
/// [`init`](init()) the unit of work still runs and its result is still
/// returned; only the record is skipped.
///
/// # Errors
///
/// Exactly the errors `work` itself returns.
pub fn log_timed<T, E, F>(level: Level, event: impl Into<Event>, work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::error::Error,
{
    match global() {
        Some(logger) => logger.log_timed(level, event, work),
        None => work(),
    }
}

/// [`log_timed`](log_timed()) at debug level.
///
/// # Errors
///
/// Exactly the errors `work` itself returns.
pub fn debug_timed<T, E, F>(event: impl Into<Event>, work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::error::Error,
{
    log_timed(Level::Debug, event, work)
}

/// [`log_timed`](log_timed()) at info level.
///
/// # Errors
///
/// Exactly the errors `work` itself returns.
pub fn info_timed<T, E, F>(event: impl Into<Event>, work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::error::Error,
{
    log_timed(Level::Info, event, work)
}

/// [`log_timed`](log_timed()) at warn level.
///
/// # Errors
///
/// Exactly the errors `work` itself returns.
pub fn warn_timed<T, E, F>(event: impl Into<Event>, work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::error::Error,
{
    log_timed(Level::Warn, event, work)
}

/// [`log_timed`](log_timed()) at error level.
///
/// # Errors
///
/// Exactly the errors `work` itself returns.
pub fn error_timed<T, E, F>(event: impl Into<Event>, work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::error::Error,
{
    log_timed(Level::Error, event, work)
}
