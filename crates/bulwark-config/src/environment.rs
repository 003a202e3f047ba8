use serde::Deserialize;

/// Deployment mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
    Test,
}

impl Environment {
    /// Whether diagnostic traces may be included in error responses
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}
