// SPDX-License-Identifier: Apache-2.0

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Meter;

pub trait Counter<T> {
    fn add(&self, value: T, attributes: &[KeyValue]);
}

/// Self-metrics counter of a pipeline stage. Stages whose debug metrics level
/// is `none` get the no-op variant.
#[derive(Clone)]
pub enum StageCounter<T> {
    OTELCounter(opentelemetry::metrics::Counter<T>),
    NoOpCounter,
}

impl<T> Counter<T> for StageCounter<T> {
    fn add(&self, value: T, attributes: &[KeyValue]) {
        match self {
            StageCounter::OTELCounter(c) => c.add(value, attributes),
            StageCounter::NoOpCounter => {}
        }
    }
}

impl<T> std::fmt::Debug for StageCounter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageCounter::OTELCounter(_) => write!(f, "OTELCounter"),
            StageCounter::NoOpCounter => write!(f, "NoOpCounter"),
        }
    }
}

pub fn get_meter() -> Meter {
    global::meter("otelcol")
}

/// Accepted and refused item counters for a receiver stage forwarding the
/// given telemetry kind (`metric_points`, `log_records`, `spans`).
pub fn receiver_counters(items: &'static str) -> (StageCounter<u64>, StageCounter<u64>) {
    let accepted = get_meter()
        .u64_counter(format!("otelcol_receiver_accepted_{}", items))
        .with_description(format!(
            "Number of {} successfully pushed into the pipeline.",
            items.replace('_', " ")
        ))
        .with_unit(items)
        .build();
    let refused = get_meter()
        .u64_counter(format!("otelcol_receiver_refused_{}", items))
        .with_description(format!(
            "Number of {} that could not be pushed into the pipeline.",
            items.replace('_', " ")
        ))
        .with_unit(items)
        .build();

    (
        StageCounter::OTELCounter(accepted),
        StageCounter::OTELCounter(refused),
    )
}
