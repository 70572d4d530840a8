use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;
use thiserror::Error;

use crate::pipeline::body::BodyLimits;
use crate::pipeline::cors::{CorsConfig, DEFAULT_ORIGIN};
use crate::pipeline::PipelineConfig;
use crate::pipeline::request_log::LogConfig;
use crate::router::PatternError;
use crate::routes;
use crate::server::Config;

/// A problem with the configuration found at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid log level \"{0}\"")]
    InvalidLogLevel(String),
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] PatternError),
}

/// HTTP front door for the student and coordinator portal. Every option can also be set through the environment.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Host name or IP address to serve from.
    #[arg(long, env = "FRONTDOOR_HOST", default_value_t = String::from("0.0.0.0"))]
    pub host: String,
    /// Port number to open on host.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
    /// The browser origin allowed to make cross-origin requests.
    #[arg(long, env = "CORS_ORIGIN", default_value_t = String::from(DEFAULT_ORIGIN))]
    pub origin: String,
    /// Stops browsers from sending cookies and authorization headers on cross-origin requests.
    #[arg(long, env = "CORS_NO_CREDENTIALS")]
    pub no_credentials: bool,
    /// Number of threads handling connections.
    #[arg(short, long, env = "FRONTDOOR_WORKERS", default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,
    /// Largest JSON or form body accepted, in bytes.
    #[arg(long, env = "FRONTDOOR_BODY_LIMIT", default_value_t = 100 * 1024)]
    pub body_limit: usize,
    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, env = "FRONTDOOR_LOG", default_value_t = String::from("info"))]
    pub log_level: String,
    /// Logs credential headers and secret body fields as they are instead of redacting them.
    #[arg(long, env = "FRONTDOOR_LOG_CREDENTIALS")]
    pub log_credentials: bool,
}

impl Args {
    /// The log level to initialize logging with.
    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    /// Settings for the front door stages.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            cors: CorsConfig { origin: self.origin.clone(), credentials: !self.no_credentials },
            body: BodyLimits { max_bytes: self.body_limit, ..BodyLimits::default() },
            log: LogConfig { redact_credentials: !self.log_credentials },
        }
    }

    /// Builds the server config, including the front door with every route group mounted.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let front_door = routes::app(&self.pipeline_config())?;
        Ok(Config {
            addr: format!("{}:{}", self.host, self.port),
            workers: self.workers as usize,
            front_door,
        })
    }
}
