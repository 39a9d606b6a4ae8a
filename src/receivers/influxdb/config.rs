// SPDX-License-Identifier: Apache-2.0

use crate::init::http_server::default_compression_algorithms;
use crate::receivers::confighttp::ServerConfig;
use serde::Serialize;

/// Configuration handed to the InfluxDB line protocol ingestion engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InfluxdbReceiverConfig {
    pub server_config: ServerConfig,
}

impl Default for InfluxdbReceiverConfig {
    fn default() -> Self {
        Self {
            server_config: ServerConfig {
                endpoint: "localhost:8086".to_string(),
                compression_algorithms: default_compression_algorithms(),
                ..Default::default()
            },
        }
    }
}

impl InfluxdbReceiverConfig {
    pub fn new(server_config: ServerConfig) -> Self {
        Self { server_config }
    }

    pub fn endpoint(&self) -> &str {
        &self.server_config.endpoint
    }
}
