use std::time::Instant;
use uuid::Uuid;

/// Per-request correlation data threaded explicitly through handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub started_at: Instant,
}

impl RequestContext {
    /// Adopts `inbound_id` when it is a UUID, otherwise assigns a fresh v4 id
    pub fn new(inbound_id: Option<&str>, method: &str, path: &str) -> Self {
        let request_id = inbound_id
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);

        Self {
            request_id: request_id.hyphenated().to_string(),
            method: method.to_string(),
            path: path.to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
