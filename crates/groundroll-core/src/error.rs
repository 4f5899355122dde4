//! Error types for shared-state construction.

use std::error::Error;
use std::fmt;

/// Errors from [`SharedState::create`](crate::SharedState::create).
///
/// Construction is the only fatal seam in the state layer: a failing
/// initialization hook aborts the scenario before any worker starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitError {
    /// The scenario's initialization hook rejected the state.
    Hook {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hook { reason } => write!(f, "state initialization hook failed: {reason}"),
        }
    }
}

impl Error for InitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let err = InitError::Hook {
            reason: "target speed must be positive".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("initialization hook failed"));
        assert!(msg.contains("target speed"));
    }
}
