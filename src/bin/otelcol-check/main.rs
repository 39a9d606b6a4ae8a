// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, ValueEnum};
use otelcol_influxdb::component::Registry;
use otelcol_influxdb::featuregate::Stability;
use otelcol_influxdb::init::config_file::ConfigFile;
use otelcol_influxdb::init::influxdb_receiver::{self, InfluxdbReceiverArgs};
use otelcol_influxdb::receivers::adapter::{NopFactory, ReceiverArguments};
use otelcol_influxdb::receivers::influxdb::{COMPONENT_TYPE, InfluxdbReceiverConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tower::BoxError;
use tracing::metadata::LevelFilter;
use tracing::{error, info};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry as SubscriberRegistry};

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// List registered components
    Components,

    /// Load and validate every component of a pipeline file
    Validate {
        /// Pipeline file (TOML)
        #[arg(long, env = "OTELCOL_CONFIG")]
        config: PathBuf,
    },

    /// Return version
    Version,
}

#[derive(Debug, Parser)]
#[command(name = "otelcol-check")]
#[command(bin_name = "otelcol-check")]
#[command(version, about, long_about = None)]
#[command(subcommand_required = true)]
struct Arguments {
    /// Log format
    #[arg(
        value_enum,
        long,
        global = true,
        env = "OTELCOL_LOG_FORMAT",
        default_value = "text"
    )]
    log_format: LogFormatArg,

    /// Minimum stability level of components that may be loaded
    #[arg(
        value_enum,
        long,
        global = true,
        env = "OTELCOL_STABILITY_LEVEL",
        default_value = "generally-available"
    )]
    stability_level: Stability,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

fn main() -> ExitCode {
    let opt = Arguments::parse();

    let _guard = match setup_logging(&opt.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ERROR: failed to setup logging: {}", e);
            return ExitCode::from(1);
        }
    };

    let registry = match build_registry(opt.stability_level) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Failed to register components.");
            return ExitCode::from(1);
        }
    };

    match opt.command {
        Some(Commands::Version) => {
            println!("{}", get_version());
        }
        Some(Commands::Components) => {
            for reg in registry.registrations() {
                println!("{}\t{}", reg.name(), reg.stability());
            }
        }
        Some(Commands::Validate { config }) => {
            if let Err(e) = validate(&registry, config) {
                error!(error = %e, "Configuration is invalid.");
                return ExitCode::from(1);
            }
        }
        None => {
            // it shouldn't be possible to get here since we mark a subcommand as
            // required
            error!("Must specify a command");
            return ExitCode::from(2);
        }
    }

    ExitCode::SUCCESS
}

fn build_registry(min_stability: Stability) -> Result<Registry, BoxError> {
    let mut registry = Registry::new(min_stability);
    influxdb_receiver::register(&mut registry, || {
        NopFactory::<InfluxdbReceiverConfig>::new(COMPONENT_TYPE)
    })?;
    Ok(registry)
}

fn validate(registry: &Registry, path: PathBuf) -> Result<(), BoxError> {
    let cfg = ConfigFile::from_path(&path)?;

    let mut failures = 0;
    for loaded in cfg.load(registry)? {
        match &loaded.result {
            Ok(args) => {
                info!(id = loaded.id.as_str(), "Component configuration is valid");
                if let Some(args) = args.get::<InfluxdbReceiverArgs>() {
                    let native = args.convert()?;
                    println!("{}: {}", loaded.id, serde_json::to_string_pretty(&native)?);
                }
            }
            Err(e) => {
                failures += 1;
                error!(id = loaded.id.as_str(), error = %e, "Invalid component configuration");
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} components failed to load", failures, cfg.components.len()).into());
    }
    Ok(())
}

type LoggerGuard = tracing_appender::non_blocking::WorkerGuard;

fn setup_logging(log_format: &LogFormatArg) -> Result<LoggerGuard, BoxError> {
    LogTracer::init()?;

    // Command output goes to stdout, logs to stderr
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?
        .add_directive("opentelemetry=warn".parse()?);

    if *log_format == LogFormatArg::Json {
        let app_name = format!("{}-{}", env!("CARGO_PKG_NAME"), get_version());
        let bunyan_formatting_layer = BunyanFormattingLayer::new(app_name, non_blocking_writer);

        let subscriber = SubscriberRegistry::default()
            .with(filter)
            .with(JsonStorageLayer)
            .with(bunyan_formatting_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        use std::io;
        use std::io::IsTerminal;

        // Skip color codes when not in a terminal
        let use_ansi = io::stderr().is_terminal();

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_target(false)
            .with_level(true)
            .with_ansi(use_ansi)
            .compact();

        let subscriber = SubscriberRegistry::default().with(filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(guard)
}

fn get_version() -> String {
    // Set during CI
    let version_build = option_env!("BUILD_SHORT_SHA").unwrap_or("dev");

    format!("{}-{}", env!("CARGO_PKG_VERSION"), version_build)
}
