//! Structured request log events.
//!
//! Events go through `tracing`, so they carry timestamp and level from the
//! subscriber logfire installs at startup. Emitting never fails: without a
//! subscriber the macros are no-ops.

use crate::metric::WebhookResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One request-scoped log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: &'static str,
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub latency_ms: Option<u64>,
    pub message_id: Option<String>,
    pub dup: Option<bool>,
    pub result: Option<WebhookResult>,
    /// Offending payload field of a validation failure
    pub field: Option<&'static str>,
    pub error: Option<String>,
}

impl LogEvent {
    pub fn new(
        level: LogLevel,
        message: &'static str,
        request_id: &str,
        method: &str,
        path: &str,
        status: u16,
    ) -> Self {
        Self {
            level,
            message,
            request_id: request_id.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            status,
            latency_ms: None,
            message_id: None,
            dup: None,
            result: None,
            field: None,
            error: None,
        }
    }
}

macro_rules! emit_at {
    ($level:expr, $event:expr) => {
        tracing::event!(
            $level,
            request_id = $event.request_id.as_str(),
            method = $event.method.as_str(),
            path = $event.path.as_str(),
            status = $event.status,
            latency_ms = $event.latency_ms,
            message_id = $event.message_id.as_deref(),
            dup = $event.dup,
            result = $event.result.map(|r| r.as_str()),
            field = $event.field,
            error = $event.error.as_deref(),
            "{}",
            $event.message
        )
    };
}

pub fn emit(event: &LogEvent) {
    match event.level {
        LogLevel::Info => emit_at!(tracing::Level::INFO, event),
        LogLevel::Warn => emit_at!(tracing::Level::WARN, event),
        LogLevel::Error => emit_at!(tracing::Level::ERROR, event),
    }
}
