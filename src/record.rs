use serde_json::{Map, Value};

/// One structured log entry under construction.
///
/// Fields keep their insertion order, which is the order they are written
/// on the wire. Re-inserting an existing key replaces its value but keeps
/// the original position, so later writers win on key collision without
/// reshuffling the line.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Inserts every entry of `fields`, later entries winning on collision.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.fields.insert(key, value);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the record still lacks a usable `msg`.
    pub(crate) fn msg_is_unset(&self) -> bool {
        matches!(self.get("msg"), None | Some(Value::Null))
    }

    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}
