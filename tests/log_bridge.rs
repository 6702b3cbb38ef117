//! Global installation and the `log` macro bridge.
//!
//! Everything lives in one test function: a process gets exactly one
//! global logger.

use jsonline_logger::{Level, LogContext};
use pretty_assertions::assert_eq;

pub mod common;

#[test]
fn installed_logger_backs_the_log_macros() {
    let (logger, sink, _clock) = common::frozen_logger();
    let logger = logger
        .min_level(Level::Info)
        .sensitive_keys(["password"]);

    jsonline_logger::try_init(logger).unwrap();
    assert!(jsonline_logger::global().is_some());
    assert!(jsonline_logger::try_init(common::frozen_logger().0).is_err());

    // The standard macros route through the installed logger, structured
    // key/values included.
    let _guard = LogContext::new().record("request_id", "req-1").enter();
    log::info!(order_id = 7; "order placed");

    let record: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
    assert_eq!(record["msg"], "order placed");
    assert_eq!(record["log_level"], "info");
    assert_eq!(record["log_timestamp"], "2016-01-22 15:46:22 +1100 AEDT");
    assert_eq!(record["request_id"], "req-1");
    assert_eq!(record["order_id"], 7);
    sink.clear();

    // Below the severity floor nothing is formatted or written.
    log::debug!("not emitted");
    assert!(sink.lines().is_empty());

    // Crate-level functions reach the same logger.
    jsonline_logger::warn("heads up");
    let record: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
    assert_eq!(record["log_level"], "warn");
    assert_eq!(record["msg"], "heads up");
    sink.clear();

    // Sensitive keys configured on the installed logger apply to macro
    // records too.
    log::warn!(password = "hunter2"; "login failed");
    let record: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
    assert_eq!(record["password"], "[MASKED]");
    sink.clear();

    // The timed crate-level entry point returns the unit of work's result.
    let outcome: Result<u32, std::convert::Infallible> =
        jsonline_logger::info_timed("charge", || Ok(9));
    assert_eq!(outcome.unwrap(), 9);
    let record: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
    assert_eq!(record["msg"], "charge");
    assert!(record.get("duration").is_some());
}
