// SPDX-License-Identifier: Apache-2.0

pub mod registry;

pub use registry::{LoadedArgs, Registration, Registry, RegistryError};

use crate::topology::consumer::ConsumerGraph;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::BoxError;

/// Contract every component schema satisfies so the host can treat all of
/// them the same way: instantiate the zero value, default it, overlay the
/// user's block and validate the result.
pub trait Arguments: Default + Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    /// Populates defaults in place. Called once on the zero value, before the
    /// user's block is overlaid.
    fn set_to_default(&mut self) {}

    /// Rejects the first structural problem found after overlay.
    fn validate(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A built, runnable pipeline stage.
#[async_trait]
pub trait Component: Send {
    /// Runs until `cancel` fires or the component fails.
    async fn run(self: Box<Self>, cancel: CancellationToken) -> Result<(), BoxError>;
}

/// Per-stage options supplied by the host when a component is built.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Fully qualified id of the stage, e.g. `otelcol.receiver.influxdb.default`
    pub id: String,

    /// Inputs of the other stages in the pipeline graph
    pub consumers: ConsumerGraph,
}

impl Options {
    pub fn new(id: impl Into<String>, consumers: ConsumerGraph) -> Self {
        Self {
            id: id.into(),
            consumers,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Metrics,
    Logs,
    Traces,
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Metrics => write!(f, "metrics"),
            DataType::Logs => write!(f, "logs"),
            DataType::Traces => write!(f, "traces"),
        }
    }
}

/// Engine-side identity of a component: `type` or `type/name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    kind: String,
    name: Option<String>,
}

impl ComponentId {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
        }
    }

    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: Some(name.into()),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{}", self.kind, name),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A host extension a stage can depend on (authenticators, storage, ...).
pub trait Extension: Send + Sync + Debug {
    fn component_type(&self) -> &str;
}

/// An exporter a stage references directly instead of via consumers.
pub trait Exporter: Send + Sync + Debug {
    fn component_type(&self) -> &str;
}

pub type Extensions = HashMap<ComponentId, Arc<dyn Extension>>;
pub type Exporters = HashMap<DataType, HashMap<ComponentId, Arc<dyn Exporter>>>;
