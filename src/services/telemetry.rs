use crate::{logger, metric};

/// Production sink: `tracing` events plus counters kept both in the
/// OpenTelemetry meter and in-process for `GET /metrics`
#[derive(Default)]
pub struct TelemetrySink {
    counters: metric::CounterRegistry,
}

impl super::ObservabilitySink for TelemetrySink {
    fn log_event(&self, event: &logger::LogEvent) {
        logger::emit(event);
    }

    fn incr_counter(&self, name: metric::CounterName, labels: &[(&'static str, &str)]) {
        metric::add_to_meter(name, labels);
        self.counters.incr(name, labels);
    }

    fn render_metrics(&self) -> String {
        self.counters.render()
    }
}
