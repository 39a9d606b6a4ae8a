// SPDX-License-Identifier: Apache-2.0

use crate::component::{LoadedArgs, Registry};
use figment::Figment;
use figment::providers::{Format, Toml};
use figment::value::Dict;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tower::BoxError;
use tracing::debug;

/// A pipeline definition file: a list of declared stages.
///
/// ```toml
/// [[components]]
/// type = "otelcol.receiver.influxdb"
/// label = "default"
///
/// [components.args]
/// endpoint = "0.0.0.0:8086"
///
/// [components.args.output]
/// metrics = ["otelcol.exporter.otlp.default"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub components: Vec<ComponentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentBlock {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default = "default_label")]
    pub label: String,

    /// The user's arguments, overlaid onto the component's defaults
    #[serde(default)]
    pub args: Dict,
}

fn default_label() -> String {
    "default".to_string()
}

impl ComponentBlock {
    /// Pipeline-wide id of the stage, `<type>.<label>`
    pub fn id(&self) -> String {
        format!("{}.{}", self.kind, self.label)
    }
}

/// Outcome of loading one declared stage.
#[derive(Debug)]
pub struct LoadedComponent {
    pub id: String,
    pub kind: String,
    pub result: Result<LoadedArgs, BoxError>,
}

impl ConfigFile {
    pub fn from_path(path: &Path) -> Result<Self, BoxError> {
        if !path.is_file() {
            return Err(format!("config file not found: {}", path.display()).into());
        }

        Self::from_figment(Figment::from(Toml::file(path)))
            .map_err(|e| format!("failed to parse {}: {}", path.display(), e).into())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, BoxError> {
        Self::from_figment(Figment::from(Toml::string(s))).map_err(|e| e.into())
    }

    fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// Runs every declared stage through the registry's configuration
    /// lifecycle. Failures are reported per stage, so one bad block does not
    /// hide the others.
    pub fn load(&self, registry: &Registry) -> Result<Vec<LoadedComponent>, BoxError> {
        let mut seen = HashSet::new();
        for block in &self.components {
            if !seen.insert(block.id()) {
                return Err(format!("component {} is declared more than once", block.id()).into());
            }
        }

        Ok(self
            .components
            .iter()
            .map(|block| {
                debug!(id = block.id().as_str(), "Loading component");
                LoadedComponent {
                    id: block.id(),
                    kind: block.kind.clone(),
                    result: registry.load(&block.kind, &block.args),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::featuregate::Stability;
    use crate::init::influxdb_receiver::{self, InfluxdbReceiverArgs, NAME};
    use crate::receivers::adapter::NopFactory;
    use crate::receivers::influxdb::{COMPONENT_TYPE, InfluxdbReceiverConfig};
    use std::io::Write;

    fn registry() -> Registry {
        let mut registry = Registry::new(Stability::Experimental);
        influxdb_receiver::register(&mut registry, || {
            NopFactory::<InfluxdbReceiverConfig>::new(COMPONENT_TYPE)
        })
        .unwrap();
        registry
    }

    const PIPELINE: &str = r#"
        [[components]]
        type = "otelcol.receiver.influxdb"

        [components.args]
        endpoint = "0.0.0.0:8086"

        [components.args.output]
        metrics = ["otelcol.exporter.otlp.default"]

        [[components]]
        type = "otelcol.receiver.influxdb"
        label = "broken"

        [components.args]
        endpoint = ""

        [components.args.output]
        metrics = ["otelcol.exporter.otlp.default"]
    "#;

    #[test]
    fn test_load_reports_each_component() {
        let cfg = ConfigFile::from_toml_str(PIPELINE).unwrap();
        assert_eq!(2, cfg.components.len());
        assert_eq!("otelcol.receiver.influxdb.default", cfg.components[0].id());

        let loaded = cfg.load(&registry()).unwrap();
        assert_eq!(2, loaded.len());

        let args = loaded[0].result.as_ref().unwrap();
        assert_eq!(NAME, args.name());
        assert_eq!(
            "0.0.0.0:8086",
            args.get::<InfluxdbReceiverArgs>().unwrap().http_server.endpoint
        );

        assert_eq!("otelcol.receiver.influxdb.broken", loaded[1].id);
        let err = loaded[1].result.as_ref().unwrap_err();
        assert!(err.to_string().contains("endpoint cannot be empty"));
    }

    #[test]
    fn test_unknown_component_type() {
        let cfg = ConfigFile::from_toml_str(
            r#"
            [[components]]
            type = "otelcol.receiver.unknown"
            "#,
        )
        .unwrap();
        let loaded = cfg.load(&registry()).unwrap();
        assert!(loaded[0].result.is_err());
    }

    #[test]
    fn test_duplicate_ids() {
        let cfg = ConfigFile::from_toml_str(
            r#"
            [[components]]
            type = "otelcol.receiver.influxdb"

            [[components]]
            type = "otelcol.receiver.influxdb"
            label = "default"
            "#,
        )
        .unwrap();
        let err = cfg.load(&registry()).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PIPELINE.as_bytes()).unwrap();

        let cfg = ConfigFile::from_path(file.path()).unwrap();
        assert_eq!(2, cfg.components.len());

        let missing = file.path().with_extension("missing");
        assert!(ConfigFile::from_path(&missing).is_err());
    }
}
