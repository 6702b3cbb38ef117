//! Helpers for populating a context scope from inbound-request metadata.
//!
//! The HTTP framework itself stays out of this crate; a host integration
//! layer extracts whatever its request type offers and hands it over here
//! to shape the per-request scope.

use uuid::Uuid;

use crate::{ContextValue, LogContext};

/// Metadata describing one inbound request.
///
/// Missing identifiers are generated fresh, so every request scope ends up
/// with a usable `request_id` and `correlation_id` even when the client
/// sent none.
///
/// ```
/// use jsonline_logger::RequestInfo;
///
/// let _guard = RequestInfo::new()
///     .request_id("req-1")
///     .remote_ip("10.0.0.1")
///     .user_agent("curl/8.5")
///     .into_context()
///     .enter();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    request_id: Option<String>,
    remote_ip: Option<String>,
    user_agent: Option<String>,
    correlation_id: Option<String>,
}

impl RequestInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// The correlation identifier read from an inbound header, if any.
    #[must_use]
    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builds the per-request context. Enter it around request handling and
    /// drop the guard when the request completes.
    #[must_use]
    pub fn into_context(self) -> LogContext {
        LogContext::new()
            .record("request_id", self.request_id.unwrap_or_else(new_token))
            .record("remote_ip", optional(self.remote_ip))
            .record("user_agent", optional(self.user_agent))
            .record(
                "correlation_id",
                self.correlation_id.unwrap_or_else(new_token),
            )
    }
}

/// The correlation token for a request: the inbound header value when the
/// client sent one, a fresh random token otherwise.
#[must_use]
pub fn correlation_token(inbound: Option<&str>) -> String {
    inbound.map_or_else(new_token, str::to_owned)
}

fn new_token() -> String {
    Uuid::new_v4().to_string()
}

fn optional(value: Option<String>) -> ContextValue {
    value.map_or_else(ContextValue::null, ContextValue::from)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::{RequestInfo, correlation_token};
    use crate::LogContext;

    #[test]
    fn known_fields_pass_through() {
        let _guard = RequestInfo::new()
            .request_id("req-9")
            .remote_ip("127.0.0.1")
            .user_agent("test-agent")
            .correlation_id("corr-1")
            .into_context()
            .enter();
        assert_eq!(
            LogContext::current(),
            json!({
                "request_id": "req-9",
                "remote_ip": "127.0.0.1",
                "user_agent": "test-agent",
                "correlation_id": "corr-1"
            })
        );
    }

    #[test]
    fn missing_identifiers_are_generated() {
        let _guard = RequestInfo::new().into_context().enter();
        let snapshot = LogContext::current();
        let request_id = snapshot["request_id"].as_str().unwrap();
        let correlation_id = snapshot["correlation_id"].as_str().unwrap();
        assert_eq!(request_id.len(), 36);
        assert_eq!(correlation_id.len(), 36);
        assert_ne!(request_id, correlation_id);
        assert_eq!(snapshot["remote_ip"], Value::Null);
        assert_eq!(snapshot["user_agent"], Value::Null);
    }

    #[test]
    fn correlation_token_prefers_the_inbound_header() {
        assert_eq!(correlation_token(Some("corr-7")), "corr-7");
        let generated = correlation_token(None);
        assert_eq!(generated.len(), 36);
    }
}
