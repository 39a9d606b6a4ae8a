pub mod config_file;
pub mod consumer;
pub mod debug_metrics;
pub mod http_server;
pub mod influxdb_receiver;
