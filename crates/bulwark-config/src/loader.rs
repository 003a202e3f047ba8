use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`Config::parse`] fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// Expands `{{ env.VAR }}` placeholders, then deserializes and validates
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns an error if variable expansion, TOML parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if sanitization bounds are zero, the health path is
    /// not absolute, or CORS credentials are combined with a wildcard
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_sanitization()?;
        self.validate_health()?;
        self.validate_cors()?;
        Ok(())
    }

    fn validate_sanitization(&self) -> anyhow::Result<()> {
        let sanitization = &self.sanitization;

        if sanitization.max_depth == 0 {
            anyhow::bail!("sanitization.max_depth must be greater than 0");
        }

        if sanitization.body_limit == 0 {
            anyhow::bail!("sanitization.body_limit must be greater than 0");
        }

        if let Some(ref tags) = sanitization.html.tags
            && tags.iter().any(|tag| tag.trim().is_empty())
        {
            anyhow::bail!("sanitization.html.tags must not contain empty names");
        }

        Ok(())
    }

    fn validate_health(&self) -> anyhow::Result<()> {
        let health = &self.server.health;

        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/': `{}`", health.path);
        }

        Ok(())
    }

    fn validate_cors(&self) -> anyhow::Result<()> {
        let Some(ref cors) = self.server.cors else {
            return Ok(());
        };

        if cors.credentials
            && [&cors.origins, &cors.methods, &cors.headers]
                .into_iter()
                .any(|list| crate::CorsConfig::is_any(list))
        {
            anyhow::bail!("server.cors.credentials cannot be combined with \"*\" origins, methods or headers");
        }

        Ok(())
    }
}
