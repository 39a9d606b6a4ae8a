// SPDX-License-Identifier: Apache-2.0

use crate::component::{
    Arguments, Component, Exporters, Extensions, Registration, Registry, RegistryError,
};
use crate::featuregate::Stability;
use crate::init::consumer::{self, ConsumerArgs};
use crate::init::debug_metrics::DebugMetricsArgs;
use crate::init::http_server::{HttpServerArgs, default_compression_algorithms};
use crate::receivers::adapter::{ReceiverAdapter, ReceiverArguments, ReceiverFactory};
use crate::receivers::influxdb::InfluxdbReceiverConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::BoxError;

/// Registered name of the InfluxDB receiver stage
pub const NAME: &str = "otelcol.receiver.influxdb";

/// Default InfluxDB HTTP API address
pub const DEFAULT_ENDPOINT: &str = "localhost:8086";

/// Arguments of an `otelcol.receiver.influxdb` stage.
///
/// The HTTP server settings are flattened to the top level of the block,
/// `debug_metrics` is optional and `output` is required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluxdbReceiverArgs {
    #[serde(flatten)]
    pub http_server: HttpServerArgs,

    /// Self-metrics of the stage
    #[serde(default)]
    pub debug_metrics: DebugMetricsArgs,

    /// Where received metrics are sent
    #[serde(
        deserialize_with = "consumer::required",
        skip_serializing_if = "Option::is_none"
    )]
    pub output: Option<ConsumerArgs>,
}

impl Arguments for InfluxdbReceiverArgs {
    fn set_to_default(&mut self) {
        self.http_server = HttpServerArgs {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            compression_algorithms: default_compression_algorithms(),
            ..Default::default()
        };
        self.debug_metrics.set_to_default();
    }

    fn validate(&self) -> Result<(), BoxError> {
        if self.http_server.endpoint.is_empty() {
            return Err("HTTP server endpoint cannot be empty".into());
        }
        Ok(())
    }
}

impl ReceiverArguments for InfluxdbReceiverArgs {
    type Config = InfluxdbReceiverConfig;

    fn convert(&self) -> Result<InfluxdbReceiverConfig, BoxError> {
        Ok(InfluxdbReceiverConfig::new(self.http_server.convert()))
    }

    fn extensions(&self) -> Extensions {
        HashMap::new()
    }

    fn exporters(&self) -> Exporters {
        HashMap::new()
    }

    fn next_consumers(&self) -> Option<&ConsumerArgs> {
        self.output.as_ref()
    }

    fn debug_metrics_config(&self) -> DebugMetricsArgs {
        self.debug_metrics.clone()
    }
}

/// Adds the InfluxDB receiver to `registry`. `new_factory` instantiates the
/// ingestion engine's factory each time a stage is built.
pub fn register<F, N>(registry: &mut Registry, new_factory: N) -> Result<(), RegistryError>
where
    F: ReceiverFactory<Config = InfluxdbReceiverConfig>,
    N: Fn() -> F + Send + Sync + 'static,
{
    registry.register(Registration::new(
        NAME,
        Stability::Experimental,
        move |opts, args: &InfluxdbReceiverArgs| {
            let adapter = ReceiverAdapter::new(opts, new_factory(), args)?;
            Ok(Box::new(adapter) as Box<dyn Component>)
        },
    ))
}
