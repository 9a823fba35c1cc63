pub mod telemetry;

use crate::{logger, metric};
use std::sync::Arc;

/// Observability port handed to request handlers.
///
/// Both operations are fire-and-forget: implementations must not block the
/// request path and must swallow their own failures.
pub trait ObservabilitySink: Send + Sync {
    fn log_event(&self, event: &logger::LogEvent);

    fn incr_counter(&self, name: metric::CounterName, labels: &[(&'static str, &str)]);

    /// Current counter values in Prometheus text exposition format
    fn render_metrics(&self) -> String;
}

pub type ImplObservabilitySink = Arc<dyn ObservabilitySink>;

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    /// Keeps every event and counter in memory for assertions
    #[derive(Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<logger::LogEvent>>,
        counters: metric::CounterRegistry,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<logger::LogEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        pub fn webhook_count(&self, result: metric::WebhookResult) -> u64 {
            self.counters.get(
                metric::CounterName::WebhookRequests,
                &[("result", result.as_str())],
            )
        }

        pub fn http_count(&self, path: &str, status: u16) -> u64 {
            self.counters.get(
                metric::CounterName::HttpRequests,
                &[("path", path), ("status", &status.to_string())],
            )
        }
    }

    impl ObservabilitySink for RecordingSink {
        fn log_event(&self, event: &logger::LogEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        }

        fn incr_counter(&self, name: metric::CounterName, labels: &[(&'static str, &str)]) {
            self.counters.incr(name, labels);
        }

        fn render_metrics(&self) -> String {
            self.counters.render()
        }
    }
}
