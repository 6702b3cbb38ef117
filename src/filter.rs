//! Redaction of sensitive field values.

use regex::{NoExpand, Regex};
use serde_json::Value;

/// The placeholder written in place of a redacted value.
pub const MASK: &str = "[MASKED]";

/// A process-wide set of field names whose values must never reach a sink.
///
/// Key comparison is case-insensitive. The set is built once at
/// configuration time and is read-only afterwards, so it can be shared
/// freely across threads.
///
/// [`redact`](SensitiveKeys::redact) masks matching values wherever they
/// appear: as keys of (arbitrarily nested) maps, as keys inside
/// JSON-encoded string payloads, and as tag names inside XML-like string
/// payloads. Key names themselves and unrelated structure are never
/// altered, and redaction never fails; anything that cannot be recognized
/// as structured is left verbatim.
///
/// # Example
///
/// ```
/// use jsonline_logger::SensitiveKeys;
/// use serde_json::json;
///
/// let keys = SensitiveKeys::new(["password"]);
/// let redacted = keys.redact(json!({"Password": "1234", "user": "jo"}));
/// assert_eq!(redacted, json!({"Password": "[MASKED]", "user": "jo"}));
/// ```
#[derive(Debug, Default)]
pub struct SensitiveKeys {
    keys: Vec<String>,
    tag_patterns: Vec<(String, Regex)>,
}

impl SensitiveKeys {
    /// Builds the key set. Names are lowercased and deduplicated; the
    /// relative order of first occurrences is kept.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut lowered: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into().to_lowercase();
            if !key.is_empty() && !lowered.contains(&key) {
                lowered.push(key);
            }
        }
        let tag_patterns = lowered
            .iter()
            .map(|key| {
                let escaped = regex::escape(key);
                let pattern = format!("(?i)<{escaped}>\\s*.+?\\s*</{escaped}>");
                let regex = Regex::new(&pattern)
                    .expect("an escaped keyword always forms a valid tag pattern");
                (key.clone(), regex)
            })
            .collect();
        Self {
            keys: lowered,
            tag_patterns,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `key` names a sensitive field, ignoring case.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.keys.contains(&key)
    }

    /// Returns `value` with every sensitive field masked.
    ///
    /// With an empty key set the input is returned untouched; callers pay
    /// no filtering cost and risk no transformation when nothing is
    /// configured.
    #[must_use]
    pub fn redact(&self, value: Value) -> Value {
        if self.is_empty() {
            return value;
        }
        self.redact_value(value)
    }

    fn redact_value(&self, value: Value) -> Value {
        match value {
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| {
                        if self.matches(&key) {
                            (key, Value::String(MASK.to_owned()))
                        } else {
                            (key, self.redact_value(value))
                        }
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.redact_value(item)).collect())
            }
            Value::String(text) => Value::String(self.redact_text(text)),
            scalar => scalar,
        }
    }

    /// Strings may carry structured payloads of their own: JSON first, then
    /// an XML-like tag scan. A parse failure is not an error, it selects the
    /// next strategy.
    fn redact_text(&self, text: String) -> String {
        if let Ok(parsed) = serde_json::from_str::<Value>(&text) {
            if matches!(parsed, Value::Object(_) | Value::Array(_)) {
                let redacted = self.redact_value(parsed);
                return serde_json::to_string(&redacted).unwrap_or(text);
            }
        }
        self.redact_tags(text)
    }

    fn redact_tags(&self, text: String) -> String {
        let mut result = text;
        for (key, pattern) in &self.tag_patterns {
            if pattern.is_match(&result) {
                let replacement = format!("<{key}>{MASK}</{key}>");
                result = pattern
                    .replace_all(&result, NoExpand(&replacement))
                    .into_owned();
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{MASK, SensitiveKeys};

    fn keys(names: &[&str]) -> SensitiveKeys {
        SensitiveKeys::new(names.iter().copied())
    }

    #[test]
    fn empty_key_set_is_identity() {
        let empty = SensitiveKeys::default();
        let value = json!({"password": "1234", "nested": {"token": [1, "x"]}});
        assert_eq!(empty.redact(value.clone()), value);
        assert_eq!(empty.redact(json!("plain text")), json!("plain text"));
    }

    #[test]
    fn key_match_is_case_insensitive_and_preserves_key_name() {
        let redacted = keys(&["password"]).redact(json!({"Password": "x"}));
        assert_eq!(redacted, json!({"Password": MASK}));
    }

    #[test]
    fn nested_maps_are_redacted_recursively() {
        let redacted = keys(&["password"]).redact(json!({
            "msg": {"password": "1234", "foo": "bar"}
        }));
        assert_eq!(redacted, json!({"msg": {"password": MASK, "foo": "bar"}}));
    }

    #[test]
    fn list_elements_are_redacted_in_order() {
        let redacted = keys(&["secret"]).redact(json!([
            {"secret": 1, "ok": 2},
            "no match",
            {"SECRET": "x"}
        ]));
        assert_eq!(
            redacted,
            json!([{"secret": MASK, "ok": 2}, "no match", {"SECRET": MASK}])
        );
    }

    #[test]
    fn json_string_payloads_are_rewritten_as_valid_json() {
        let redacted =
            keys(&["password"]).redact(json!(r#"{"password":"1234","foo":"bar"}"#));
        assert_eq!(redacted, json!(r#"{"password":"[MASKED]","foo":"bar"}"#));
    }

    #[test]
    fn xml_tag_spans_are_masked_in_place() {
        let redacted = keys(&["password"]).redact(json!("<password>abc</password>"));
        assert_eq!(redacted, json!("<password>[MASKED]</password>"));
    }

    #[test]
    fn xml_scan_leaves_surrounding_text_verbatim() {
        let redacted = keys(&["pin"])
            .redact(json!("before <PIN> 1234 </PIN> after <other>x</other>"));
        assert_eq!(
            redacted,
            json!("before <pin>[MASKED]</pin> after <other>x</other>")
        );
    }

    #[test]
    fn unmatched_markup_is_left_alone() {
        let text = json!("<password>missing close tag");
        assert_eq!(keys(&["password"]).redact(text.clone()), text);
        let prose = json!("a < b and b > a");
        assert_eq!(keys(&["password"]).redact(prose.clone()), prose);
    }

    #[test]
    fn json_scalars_fall_through_unchanged() {
        // "123" parses as JSON but not into a map or list.
        assert_eq!(keys(&["password"]).redact(json!("123")), json!("123"));
        assert_eq!(keys(&["password"]).redact(json!(42)), json!(42));
        assert_eq!(keys(&["password"]).redact(json!(null)), json!(null));
    }

    #[test]
    fn redaction_is_idempotent() {
        let filter = keys(&["password", "token"]);
        let value = json!({
            "password": "x",
            "payload": r#"{"token":"abc"}"#,
            "xml": "<Password>y</Password>"
        });
        let once = filter.redact(value);
        let twice = filter.redact(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_and_mixed_case_keys_collapse() {
        let filter = SensitiveKeys::new(["Password", "password", "PASSWORD"]);
        assert!(filter.matches("pAsSwOrD"));
        assert_eq!(filter.redact(json!({"password": 1})), json!({"password": MASK}));
    }
}
