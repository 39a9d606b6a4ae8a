// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// HTTP server settings as consumed by an ingestion engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// `host:port` the listener binds to
    pub endpoint: String,

    pub tls: Option<TlsServerConfig>,

    pub cors: Option<CorsConfig>,

    /// Maximum accepted request body in bytes, zero selects the engine default
    pub max_request_body_size: u64,

    /// Propagate request headers as client metadata
    pub include_metadata: bool,

    /// Accepted `Content-Encoding` values, the empty string is identity
    pub compression_algorithms: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TlsServerConfig {
    pub cert_file: String,
    pub key_file: String,
    /// Enables client certificate verification when set
    pub client_ca_file: Option<String>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_headers: Vec<String>,
    /// Seconds a preflight response may be cached for
    pub max_age: u64,
}
