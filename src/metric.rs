use crate::consts;
use derive_more::Display;
use opentelemetry::{KeyValue, metrics::Counter};
use std::{
    collections::BTreeMap,
    fmt::Write,
    sync::{LazyLock, Mutex, PoisonError},
};

static HTTP_REQUESTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    logfire::u64_counter(consts::HTTP_REQUESTS_TOTAL)
        .with_description("Total HTTP requests")
        .with_unit("request")
        .build()
});

static WEBHOOK_REQUESTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    logfire::u64_counter(consts::WEBHOOK_REQUESTS_TOTAL)
        .with_description("Webhook results")
        .with_unit("request")
        .build()
});

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CounterName {
    #[display("{}", consts::HTTP_REQUESTS_TOTAL)]
    HttpRequests,
    #[display("{}", consts::WEBHOOK_REQUESTS_TOTAL)]
    WebhookRequests,
}

impl CounterName {
    fn help(&self) -> &'static str {
        match self {
            Self::HttpRequests => "Total HTTP requests",
            Self::WebhookRequests => "Webhook results",
        }
    }

    fn otel_counter(&self) -> &'static Counter<u64> {
        match self {
            Self::HttpRequests => &HTTP_REQUESTS,
            Self::WebhookRequests => &WEBHOOK_REQUESTS,
        }
    }
}

/// Outcome label of a webhook call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookResult {
    Created,
    Duplicate,
    InvalidSignature,
    ValidationError,
    PersistenceError,
}

impl WebhookResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Duplicate => "duplicate",
            Self::InvalidSignature => "invalid_signature",
            Self::ValidationError => "validation_error",
            Self::PersistenceError => "persistence_error",
        }
    }
}

/// Forwards one increment to the OpenTelemetry meter exported by logfire
pub fn add_to_meter(name: CounterName, labels: &[(&'static str, &str)]) {
    let attributes: Vec<KeyValue> = labels
        .iter()
        .map(|(key, value)| KeyValue::new(*key, value.to_string()))
        .collect();
    name.otel_counter().add(1, &attributes);
}

type LabelSet = Vec<(&'static str, String)>;

/// In-process counter values rendered by `GET /metrics`
#[derive(Default)]
pub struct CounterRegistry {
    values: Mutex<BTreeMap<CounterName, BTreeMap<LabelSet, u64>>>,
}

fn label_set(labels: &[(&'static str, &str)]) -> LabelSet {
    labels
        .iter()
        .map(|(key, value)| (*key, value.to_string()))
        .collect()
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

impl CounterRegistry {
    pub fn incr(&self, name: CounterName, labels: &[(&'static str, &str)]) {
        // a poisoned lock still holds valid counts
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        *values
            .entry(name)
            .or_default()
            .entry(label_set(labels))
            .or_default() += 1;
    }

    pub fn get(&self, name: CounterName, labels: &[(&'static str, &str)]) -> u64 {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values
            .get(&name)
            .and_then(|samples| samples.get(&label_set(labels)))
            .copied()
            .unwrap_or_default()
    }

    /// Prometheus text exposition format
    pub fn render(&self) -> String {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut output = String::new();

        for name in [CounterName::HttpRequests, CounterName::WebhookRequests] {
            let _ = writeln!(output, "# HELP {name} {}", name.help());
            let _ = writeln!(output, "# TYPE {name} counter");

            for (labels, value) in values.get(&name).into_iter().flatten() {
                let labels = labels
                    .iter()
                    .map(|(key, value)| format!("{key}=\"{}\"", escape_label_value(value)))
                    .collect::<Vec<_>>()
                    .join(",");
                let _ = writeln!(output, "{name}{{{labels}}} {value}");
            }
        }

        output
    }
}
