use std::time::Duration;

use serde::Deserialize;

const WILDCARD: &str = "*";

/// CORS configuration
///
/// Each list accepts `"*"` to allow anything; an empty list allows nothing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins, e.g. `["https://jobs.example.com"]`
    pub origins: Vec<String>,
    /// Allowed HTTP methods
    pub methods: Vec<String>,
    /// Allowed request headers
    pub headers: Vec<String>,
    /// Allow cookies and authorization headers
    pub credentials: bool,
    /// Max age for preflight cache in seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec![WILDCARD.to_owned()],
            methods: ["GET", "POST", "PUT", "PATCH", "DELETE"].map(str::to_owned).to_vec(),
            headers: vec![WILDCARD.to_owned()],
            credentials: false,
            max_age: None,
        }
    }
}

impl CorsConfig {
    /// Whether `list` is the wildcard
    pub fn is_any(list: &[String]) -> bool {
        list.iter().any(|item| item == WILDCARD)
    }

    /// Get max age as Duration
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}
