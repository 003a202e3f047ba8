use thiserror::Error;

/// Errors raised while sanitizing a structured payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// Payload nests containers deeper than the configured bound
    #[error("payload nesting exceeds maximum depth of {max_depth}")]
    DepthExceeded {
        /// Bound that was exceeded
        max_depth: usize,
    },
}
