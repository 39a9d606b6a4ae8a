// SPDX-License-Identifier: Apache-2.0

use crate::bounded_channel::BoundedSender;
use crate::telemetry::{Counter, StageCounter};
use crate::topology::fanout::Fanout;
use opentelemetry::KeyValue;
use opentelemetry_proto::tonic::logs::v1::ResourceLogs;
use opentelemetry_proto::tonic::metrics::v1::ResourceMetrics;
use opentelemetry_proto::tonic::metrics::v1::metric::Data;
use opentelemetry_proto::tonic::trace::v1::ResourceSpans;
use std::collections::HashMap;
use tower::BoxError;

/// Number of individual telemetry items (points, records, spans) in a resource
/// batch, used for self-metrics.
pub trait ItemCount {
    fn item_count(&self) -> u64;
}

impl ItemCount for ResourceMetrics {
    fn item_count(&self) -> u64 {
        self.scope_metrics
            .iter()
            .flat_map(|sm| sm.metrics.iter())
            .map(|m| match &m.data {
                Some(Data::Gauge(g)) => g.data_points.len(),
                Some(Data::Sum(s)) => s.data_points.len(),
                Some(Data::Histogram(h)) => h.data_points.len(),
                Some(Data::ExponentialHistogram(h)) => h.data_points.len(),
                Some(Data::Summary(s)) => s.data_points.len(),
                None => 0,
            } as u64)
            .sum()
    }
}

impl ItemCount for ResourceLogs {
    fn item_count(&self) -> u64 {
        self.scope_logs
            .iter()
            .map(|sl| sl.log_records.len() as u64)
            .sum()
    }
}

impl ItemCount for ResourceSpans {
    fn item_count(&self) -> u64 {
        self.scope_spans.iter().map(|ss| ss.spans.len() as u64).sum()
    }
}

/// Entry point handed to an ingestion engine: everything it decodes is pushed
/// through here to the downstream consumers of the stage.
#[derive(Clone, Debug)]
pub struct Consumer<T> {
    fanout: Fanout<T>,
    accepted: StageCounter<u64>,
    refused: StageCounter<u64>,
    tags: Vec<KeyValue>,
}

pub type MetricsConsumer = Consumer<ResourceMetrics>;
pub type LogsConsumer = Consumer<ResourceLogs>;
pub type TracesConsumer = Consumer<ResourceSpans>;

impl<T> Consumer<T>
where
    T: Clone + ItemCount,
{
    pub fn new(fanout: Fanout<T>) -> Self {
        Self {
            fanout,
            accepted: StageCounter::NoOpCounter,
            refused: StageCounter::NoOpCounter,
            tags: vec![],
        }
    }

    pub fn with_counters(
        mut self,
        accepted: StageCounter<u64>,
        refused: StageCounter<u64>,
        tags: Vec<KeyValue>,
    ) -> Self {
        self.accepted = accepted;
        self.refused = refused;
        self.tags = tags;
        self
    }

    pub fn fanout_len(&self) -> usize {
        self.fanout.len()
    }

    pub async fn consume(&self, batch: Vec<T>) -> Result<(), BoxError> {
        let count: u64 = batch.iter().map(|r| r.item_count()).sum();

        match self.fanout.send(batch).await {
            Ok(()) => {
                self.accepted.add(count, &self.tags);
                Ok(())
            }
            Err(e) => {
                self.refused.add(count, &self.tags);
                Err(e.into())
            }
        }
    }
}

/// Named inputs of the downstream components in a pipeline graph. Output
/// blocks reference these names; the receiver adapter resolves them here.
#[derive(Clone, Default, Debug)]
pub struct ConsumerGraph {
    metrics: HashMap<String, BoundedSender<Vec<ResourceMetrics>>>,
    logs: HashMap<String, BoundedSender<Vec<ResourceLogs>>>,
    traces: HashMap<String, BoundedSender<Vec<ResourceSpans>>>,
}

impl ConsumerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(
        mut self,
        name: impl Into<String>,
        tx: BoundedSender<Vec<ResourceMetrics>>,
    ) -> Self {
        self.metrics.insert(name.into(), tx);
        self
    }

    pub fn with_logs(mut self, name: impl Into<String>, tx: BoundedSender<Vec<ResourceLogs>>) -> Self {
        self.logs.insert(name.into(), tx);
        self
    }

    pub fn with_traces(
        mut self,
        name: impl Into<String>,
        tx: BoundedSender<Vec<ResourceSpans>>,
    ) -> Self {
        self.traces.insert(name.into(), tx);
        self
    }

    pub fn metrics(&self, name: &str) -> Option<&BoundedSender<Vec<ResourceMetrics>>> {
        self.metrics.get(name)
    }

    pub fn logs(&self, name: &str) -> Option<&BoundedSender<Vec<ResourceLogs>>> {
        self.logs.get(name)
    }

    pub fn traces(&self, name: &str) -> Option<&BoundedSender<Vec<ResourceSpans>>> {
        self.traces.get(name)
    }
}
