#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod environment;
mod loader;
pub mod sanitization;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use cors::*;
pub use environment::*;
pub use sanitization::*;
pub use server::*;
pub use telemetry::*;

/// Top-level Bulwark configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Deployment mode; only `development` exposes error traces
    #[serde(default)]
    pub environment: Environment,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Inbound payload sanitization
    #[serde(default)]
    pub sanitization: SanitizationConfig,
    /// Log output configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
