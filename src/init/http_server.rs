// SPDX-License-Identifier: Apache-2.0

use crate::receivers::confighttp::{CorsConfig, ServerConfig, TlsServerConfig};
use serde::{Deserialize, Serialize};

/// Request encodings accepted by HTTP based receivers unless configured
/// otherwise. The empty string accepts uncompressed bodies.
pub const DEFAULT_COMPRESSION_ALGORITHMS: &[&str] =
    &["", "gzip", "zstd", "zlib", "snappy", "deflate", "lz4"];

/// Returns a freshly allocated copy of the default compression list. Each
/// schema gets its own copy.
pub fn default_compression_algorithms() -> Vec<String> {
    DEFAULT_COMPRESSION_ALGORITHMS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// HTTP server binding settings shared by HTTP based receivers. Embedding
/// schemas flatten these fields into their own top level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerArgs {
    /// Listen address, `host:port`
    pub endpoint: String,

    /// TLS settings, plain HTTP when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsServerArgs>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsArgs>,

    /// Maximum request body size in bytes, zero uses the engine default
    pub max_request_body_size: u64,

    pub include_metadata: bool,

    pub compression_algorithms: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsServerArgs {
    pub cert_file: String,
    pub key_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ca_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsArgs {
    pub allowed_origins: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: u64,
}

impl HttpServerArgs {
    /// Maps the settings onto the engine's server config. Values are copied
    /// as-is; checking them is left to the engine.
    pub fn convert(&self) -> ServerConfig {
        ServerConfig {
            endpoint: self.endpoint.clone(),
            tls: self.tls.as_ref().map(TlsServerArgs::convert),
            cors: self.cors.as_ref().map(CorsArgs::convert),
            max_request_body_size: self.max_request_body_size,
            include_metadata: self.include_metadata,
            compression_algorithms: self.compression_algorithms.clone(),
        }
    }
}

impl TlsServerArgs {
    pub fn convert(&self) -> TlsServerConfig {
        TlsServerConfig {
            cert_file: self.cert_file.clone(),
            key_file: self.key_file.clone(),
            client_ca_file: self.client_ca_file.clone(),
            min_version: self.min_version.clone(),
            max_version: self.max_version.clone(),
        }
    }
}

impl CorsArgs {
    pub fn convert(&self) -> CorsConfig {
        CorsConfig {
            allowed_origins: self.allowed_origins.clone(),
            allowed_headers: self.allowed_headers.clone(),
            max_age: self.max_age,
        }
    }
}
