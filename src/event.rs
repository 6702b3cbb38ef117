use std::backtrace::{Backtrace, BacktraceStatus};

use serde_json::{Map, Value};

use crate::ContextValue;

/// What a single log call wants to say: an optional message (plain text or
/// a structured value), caller-supplied fields, and optionally an error to
/// report without running a unit of work.
///
/// Plain strings convert directly, so `logger.info("hello")` works; richer
/// events are built up:
///
/// ```
/// use jsonline_logger::Event;
///
/// # #[derive(Debug, thiserror::Error)]
/// # #[error("connection refused")]
/// # struct ConnectError;
/// let event = Event::message("payment failed")
///     .field("order_id", "ord-7")
///     .exception(&ConnectError);
/// ```
#[derive(Debug, Default)]
pub struct Event {
    pub(crate) msg: Option<Value>,
    pub(crate) fields: Map<String, Value>,
    pub(crate) exception: Option<ExceptionDetail>,
}

impl Event {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An event whose `msg` is plain text.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            msg: Some(Value::String(text.into())),
            ..Self::default()
        }
    }

    /// An event whose `msg` is a structured value, kept nested on the wire.
    ///
    /// Values that cannot be serialized degrade to a `null` message.
    #[must_use]
    pub fn structured(msg: impl serde::Serialize) -> Self {
        Self {
            msg: Some(serde_json::to_value(msg).unwrap_or(Value::Null)),
            ..Self::default()
        }
    }

    /// Attaches a caller-supplied field. These win over context fields on
    /// key collision.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.fields.insert(key.into(), value.into().to_json());
        self
    }

    /// Attaches a pre-existing error to report.
    ///
    /// The record gains `exception_class` and `exception_message` fields
    /// (plus `exception_backtrace` when backtraces are enabled via
    /// `RUST_BACKTRACE`), and the error's display text becomes the `msg`
    /// if none was supplied.
    #[must_use]
    pub fn exception<E>(mut self, error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        self.exception = Some(ExceptionDetail::capture(error));
        self
    }
}

impl From<&str> for Event {
    fn from(text: &str) -> Self {
        Self::message(text)
    }
}

impl From<String> for Event {
    fn from(text: String) -> Self {
        Self::message(text)
    }
}

impl From<Value> for Event {
    fn from(msg: Value) -> Self {
        Self {
            msg: Some(msg),
            ..Self::default()
        }
    }
}

/// Error detail captured for a record.
#[derive(Debug, Clone)]
pub(crate) struct ExceptionDetail {
    pub(crate) class: String,
    pub(crate) message: String,
    backtrace: Option<String>,
}

impl ExceptionDetail {
    pub(crate) fn capture<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let backtrace = Backtrace::capture();
        let backtrace = matches!(backtrace.status(), BacktraceStatus::Captured)
            .then(|| backtrace.to_string());
        Self {
            class: std::any::type_name::<E>().to_owned(),
            message: error.to_string(),
            backtrace,
        }
    }

    /// The backtrace truncated to the first `limit` frames, if one was
    /// captured at all.
    pub(crate) fn backtrace_frames(&self, limit: usize) -> Option<String> {
        let backtrace = self.backtrace.as_deref()?;
        let mut frames_seen = 0usize;
        let mut kept = Vec::new();
        for line in backtrace.lines() {
            if is_frame_start(line) {
                frames_seen += 1;
                if frames_seen > limit {
                    break;
                }
            }
            kept.push(line);
        }
        Some(kept.join("\n"))
    }
}

// Frame headers in std's backtrace rendering look like "  13: module::fn".
fn is_frame_start(line: &str) -> bool {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && trimmed[digits..].starts_with(':')
}
