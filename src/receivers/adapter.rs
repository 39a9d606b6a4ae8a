// SPDX-License-Identifier: Apache-2.0

use crate::bounded_channel::BoundedSender;
use crate::component::{
    Arguments, Component, ComponentId, DataType, Exporters, Extensions, Options,
};
use crate::init::consumer::ConsumerArgs;
use crate::init::debug_metrics::DebugMetricsArgs;
use crate::telemetry::receiver_counters;
use crate::topology::consumer::{Consumer, ItemCount, LogsConsumer, MetricsConsumer, TracesConsumer};
use crate::topology::fanout::Fanout;
use async_trait::async_trait;
use opentelemetry::KeyValue;
use std::fmt::Debug;
use std::marker::PhantomData;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tracing::{debug, error, info, warn};

/// Schema of a receiver stage. On top of the generic lifecycle it converts
/// into the engine's native config and declares the stage's place in the
/// pipeline graph.
pub trait ReceiverArguments: Arguments {
    type Config: Debug + Send + Sync + 'static;

    /// Maps a validated schema onto the engine config. Must not re-validate.
    fn convert(&self) -> Result<Self::Config, BoxError>;

    /// Host extensions the stage depends on.
    fn extensions(&self) -> Extensions;

    /// Exporters the stage references directly.
    fn exporters(&self) -> Exporters;

    /// Downstream consumers of the decoded telemetry.
    fn next_consumers(&self) -> Option<&ConsumerArgs>;

    fn debug_metrics_config(&self) -> DebugMetricsArgs;
}

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("{data_type} are not supported by the {component_type} receiver")]
    DataTypeNotSupported {
        data_type: DataType,
        component_type: String,
    },
}

/// Settings an engine receives alongside its config when a receiver is created.
#[derive(Clone, Debug)]
pub struct CreateSettings {
    pub id: ComponentId,
    pub debug_metrics: DebugMetricsArgs,
}

/// What a started engine receiver can reach in its host.
#[derive(Clone, Debug, Default)]
pub struct Host {
    pub extensions: Extensions,
    pub exporters: Exporters,
}

/// A receiver instance created by an ingestion engine.
#[async_trait]
pub trait EngineReceiver: Send {
    async fn start(&mut self, host: &Host) -> Result<(), BoxError>;

    async fn shutdown(&mut self) -> Result<(), BoxError>;
}

/// Factory of an ingestion engine. The create methods of telemetry kinds the
/// engine cannot produce keep the default `DataTypeNotSupported` error.
pub trait ReceiverFactory: Send + Sync + 'static {
    type Config: Debug + Send + Sync + 'static;

    fn component_type(&self) -> &'static str;

    fn create_default_config(&self) -> Self::Config;

    fn create_metrics(
        &self,
        _settings: &CreateSettings,
        _config: &Self::Config,
        _next: MetricsConsumer,
    ) -> Result<Box<dyn EngineReceiver>, BoxError> {
        Err(not_supported(DataType::Metrics, self.component_type()))
    }

    fn create_logs(
        &self,
        _settings: &CreateSettings,
        _config: &Self::Config,
        _next: LogsConsumer,
    ) -> Result<Box<dyn EngineReceiver>, BoxError> {
        Err(not_supported(DataType::Logs, self.component_type()))
    }

    fn create_traces(
        &self,
        _settings: &CreateSettings,
        _config: &Self::Config,
        _next: TracesConsumer,
    ) -> Result<Box<dyn EngineReceiver>, BoxError> {
        Err(not_supported(DataType::Traces, self.component_type()))
    }
}

fn not_supported(data_type: DataType, component_type: &str) -> BoxError {
    ReceiverError::DataTypeNotSupported {
        data_type,
        component_type: component_type.to_string(),
    }
    .into()
}

fn is_not_supported(err: &BoxError) -> bool {
    matches!(
        err.downcast_ref::<ReceiverError>(),
        Some(ReceiverError::DataTypeNotSupported { .. })
    )
}

/// A receiver stage running on top of an ingestion engine.
pub struct ReceiverAdapter {
    id: String,
    host: Host,
    receivers: Vec<(DataType, Box<dyn EngineReceiver>)>,
}

impl Debug for ReceiverAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverAdapter")
            .field("id", &self.id)
            .field("receivers", &self.data_types())
            .finish()
    }
}

impl ReceiverAdapter {
    /// Converts `args`, resolves its output against the pipeline graph and
    /// creates an engine receiver for every telemetry kind that has consumers.
    pub fn new<F, A>(opts: Options, factory: F, args: &A) -> Result<Self, BoxError>
    where
        F: ReceiverFactory,
        A: ReceiverArguments<Config = F::Config>,
    {
        let config = args.convert()?;

        let next = args
            .next_consumers()
            .ok_or_else(|| format!("{}: output block is required", opts.id))?;

        let id = if opts.id.is_empty() {
            ComponentId::new(factory.component_type())
        } else {
            ComponentId::with_name(factory.component_type(), opts.id.clone())
        };
        let settings = CreateSettings {
            id,
            debug_metrics: args.debug_metrics_config(),
        };

        let host = Host {
            extensions: args.extensions(),
            exporters: args.exporters(),
        };

        let mut receivers = Vec::new();

        if !next.metrics.is_empty() {
            let txs = resolve(&next.metrics, DataType::Metrics, |n| opts.consumers.metrics(n))?;
            let consumer = instrument(Consumer::new(Fanout::new(txs)?), "metric_points", &settings);
            add_receiver(
                &mut receivers,
                DataType::Metrics,
                factory.create_metrics(&settings, &config, consumer),
            )?;
        }

        if !next.logs.is_empty() {
            let txs = resolve(&next.logs, DataType::Logs, |n| opts.consumers.logs(n))?;
            let consumer = instrument(Consumer::new(Fanout::new(txs)?), "log_records", &settings);
            add_receiver(
                &mut receivers,
                DataType::Logs,
                factory.create_logs(&settings, &config, consumer),
            )?;
        }

        if !next.traces.is_empty() {
            let txs = resolve(&next.traces, DataType::Traces, |n| opts.consumers.traces(n))?;
            let consumer = instrument(Consumer::new(Fanout::new(txs)?), "spans", &settings);
            add_receiver(
                &mut receivers,
                DataType::Traces,
                factory.create_traces(&settings, &config, consumer),
            )?;
        }

        if receivers.is_empty() {
            warn!(
                id = opts.id.as_str(),
                "No engine receivers created, the stage has no supported consumers"
            );
        }

        Ok(Self {
            id: opts.id,
            host,
            receivers,
        })
    }

    /// Telemetry kinds an engine receiver was created for, in start order.
    pub fn data_types(&self) -> Vec<DataType> {
        self.receivers.iter().map(|(dt, _)| *dt).collect()
    }
}

fn resolve<'a, T: 'a>(
    names: &[String],
    data_type: DataType,
    lookup: impl Fn(&str) -> Option<&'a BoundedSender<Vec<T>>>,
) -> Result<Vec<BoundedSender<Vec<T>>>, BoxError> {
    names
        .iter()
        .map(|name| {
            lookup(name)
                .cloned()
                .ok_or_else(|| -> BoxError {
                    format!("unknown {} consumer {:?}", data_type, name).into()
                })
        })
        .collect()
}

fn instrument<T: Clone + ItemCount>(
    consumer: Consumer<T>,
    items: &'static str,
    settings: &CreateSettings,
) -> Consumer<T> {
    if !settings.debug_metrics.enabled() {
        return consumer;
    }

    let (accepted, refused) = receiver_counters(items);
    let tags = vec![KeyValue::new("receiver", settings.id.to_string())];
    consumer.with_counters(accepted, refused, tags)
}

fn add_receiver(
    receivers: &mut Vec<(DataType, Box<dyn EngineReceiver>)>,
    data_type: DataType,
    created: Result<Box<dyn EngineReceiver>, BoxError>,
) -> Result<(), BoxError> {
    match created {
        Ok(receiver) => {
            receivers.push((data_type, receiver));
            Ok(())
        }
        Err(e) if is_not_supported(&e) => {
            debug!(%data_type, error = %e, "Skipping unsupported telemetry type");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl Component for ReceiverAdapter {
    async fn run(self: Box<Self>, cancel: CancellationToken) -> Result<(), BoxError> {
        let ReceiverAdapter {
            id,
            host,
            mut receivers,
        } = *self;

        let mut started = 0;
        let mut result = Ok(());
        for (data_type, receiver) in receivers.iter_mut() {
            if let Err(e) = receiver.start(&host).await {
                error!(id = id.as_str(), %data_type, error = %e, "Failed to start receiver");
                result = Err(e);
                break;
            }
            info!(id = id.as_str(), %data_type, "Started receiver");
            started += 1;
        }

        if result.is_ok() {
            cancel.cancelled().await;
        }

        for (data_type, receiver) in receivers[..started].iter_mut().rev() {
            match receiver.shutdown().await {
                Ok(()) => debug!(id = id.as_str(), %data_type, "Receiver shut down"),
                Err(e) => {
                    error!(id = id.as_str(), %data_type, error = %e, "Failed to shut down receiver");
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }

        result
    }
}

/// Engine factory whose receivers accept no traffic. Stands in for a real
/// engine where only the configuration lifecycle matters.
pub struct NopFactory<C> {
    component_type: &'static str,
    _config: PhantomData<fn() -> C>,
}

impl<C> NopFactory<C> {
    pub fn new(component_type: &'static str) -> Self {
        Self {
            component_type,
            _config: PhantomData,
        }
    }
}

struct NopReceiver;

#[async_trait]
impl EngineReceiver for NopReceiver {
    async fn start(&mut self, _host: &Host) -> Result<(), BoxError> {
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<C> ReceiverFactory for NopFactory<C>
where
    C: Default + Debug + Send + Sync + 'static,
{
    type Config = C;

    fn component_type(&self) -> &'static str {
        self.component_type
    }

    fn create_default_config(&self) -> C {
        C::default()
    }

    fn create_metrics(
        &self,
        _settings: &CreateSettings,
        _config: &C,
        _next: MetricsConsumer,
    ) -> Result<Box<dyn EngineReceiver>, BoxError> {
        Ok(Box::new(NopReceiver))
    }

    fn create_logs(
        &self,
        _settings: &CreateSettings,
        _config: &C,
        _next: LogsConsumer,
    ) -> Result<Box<dyn EngineReceiver>, BoxError> {
        Ok(Box::new(NopReceiver))
    }

    fn create_traces(
        &self,
        _settings: &CreateSettings,
        _config: &C,
        _next: TracesConsumer,
    ) -> Result<Box<dyn EngineReceiver>, BoxError> {
        Ok(Box::new(NopReceiver))
    }
}
