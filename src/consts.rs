pub const SIGNATURE_HEADER: &str = "X-Signature";
/// Lowercase so it can build a static `HeaderName`
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const TEXT_MAX_CHARS: usize = 4096;
/// Webhook bodies past this size are hashed but not buffered
pub const WEBHOOK_MAX_BODY_BYTES: usize = 256 * 1024;

pub const MESSAGES_DEFAULT_LIMIT: i64 = 50;
pub const MESSAGES_MAX_LIMIT: i64 = 100;
pub const STATS_TOP_SENDERS: i64 = 10;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const WEBHOOK_REQUESTS_TOTAL: &str = "webhook_requests_total";
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
