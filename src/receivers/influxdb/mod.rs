// SPDX-License-Identifier: Apache-2.0

pub mod config;

pub use config::InfluxdbReceiverConfig;

/// Engine component type of the InfluxDB line protocol receiver
pub const COMPONENT_TYPE: &str = "influxdb";
