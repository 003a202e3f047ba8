use bulwark_sanitize::{DEFAULT_MAX_DEPTH, PolicyOverride};
use serde::Deserialize;

/// Inbound payload sanitization settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizationConfig {
    /// Maximum nesting of arrays/objects in a body or query
    pub max_depth: usize,
    /// Largest JSON body buffered for sanitization, in bytes
    pub body_limit: usize,
    /// Overrides merged over the default HTML allow-list
    pub html: PolicyOverride,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            body_limit: 1024 * 1024,
            html: PolicyOverride::default(),
        }
    }
}
