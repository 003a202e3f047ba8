//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use bulwark_config::{Config, CorsConfig, Environment, HealthConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                    cors: None,
                },
                ..Config::default()
            },
        }
    }

    /// Set the deployment mode
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Bound payload nesting
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.sanitization.max_depth = max_depth;
        self
    }

    /// Bound buffered JSON and form bodies
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.config.sanitization.body_limit = body_limit;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }

    /// Build the config, applying the same checks as loading from a file
    pub fn try_build(self) -> anyhow::Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
