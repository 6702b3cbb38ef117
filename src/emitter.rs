use serde_json::Value;

use crate::{Level, Record, filter::SensitiveKeys, sink::Sink};

/// Turns a finished [`Record`] into one redacted JSON line on the sink.
pub(crate) struct Emitter {
    sink: Box<dyn Sink>,
    keys: SensitiveKeys,
}

impl Emitter {
    pub(crate) fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            sink,
            keys: SensitiveKeys::default(),
        }
    }

    pub(crate) fn set_keys(&mut self, keys: SensitiveKeys) {
        self.keys = keys;
    }

    /// Writes the record to the sink exactly once.
    ///
    /// A sink or serialization failure is reported on stderr and the line
    /// is dropped; logging must not add failure modes to the caller.
    pub(crate) fn emit(&self, level: Level, record: Record) {
        let mut fields = record.into_fields();

        if let Some(msg) = fields.get_mut("msg") {
            match msg {
                Value::String(text) => {
                    let trimmed = text.trim();
                    if trimmed.len() != text.len() {
                        *msg = Value::String(trimmed.to_owned());
                    }
                }
                // Structured messages stay nested; the redaction pass below
                // walks into them. A null message stays null.
                Value::Object(_) | Value::Array(_) | Value::Null => {}
                ref other => *msg = Value::String(other.to_string()),
            }
        }

        let filtered = self.keys.redact(Value::Object(fields));
        match serde_json::to_string(&filtered) {
            Ok(line) => {
                if let Err(err) = self.sink.write(level, &line) {
                    // We can't log here; logging is what just failed.
                    eprintln!("failed to write log record: {err}");
                }
            }
            Err(err) => eprintln!("failed to serialize log record: {err}"),
        }
    }

    pub(crate) fn flush(&self) {
        if let Err(err) = self.sink.flush() {
            eprintln!("failed to flush log sink: {err}");
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
