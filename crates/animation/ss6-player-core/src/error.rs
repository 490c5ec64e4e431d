//! Error types for the player core

/// Failures surfaced by the fallible `Player`/`Project` calls.
///
/// Per-frame resolution never fails; parts that cannot be resolved are skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PlayerError {
    /// No animation with this pack/animation name in the data source
    #[error("Animation not found: {pack}/{anim}")]
    AnimationNotFound { pack: String, anim: String },

    /// Instance reference name is not of the form "pack/anim"
    #[error("Malformed instance reference: {name}")]
    MalformedReference { name: String },

    /// Operation requires a player bound with `setup`
    #[error("Player is not set up")]
    NotSetUp,

    /// No part with this name in the bound animation
    #[error("Part not found: {name}")]
    PartNotFound { name: String },

    /// Part exists but its cached object is not a nested player
    #[error("Part {name} does not hold an instance player")]
    NotAnInstance { name: String },

    /// Instance would play an animation that is already an ancestor
    #[error("Recursive instance: {pack}/{anim} already plays above this part")]
    RecursiveInstance { pack: String, anim: String },

    /// Instance nesting deeper than the configured limit
    #[error("Instance depth {depth} exceeds limit {limit}")]
    InstanceDepthExceeded { depth: usize, limit: usize },

    /// Cell id is not in the data source
    #[error("Cell not found: {cell}")]
    CellNotFound { cell: i32 },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl PlayerError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::AnimationNotFound { .. }
            | Self::MalformedReference { .. }
            | Self::PartNotFound { .. }
            | Self::CellNotFound { .. } => "data",
            Self::NotSetUp | Self::NotAnInstance { .. } => "player",
            Self::RecursiveInstance { .. } | Self::InstanceDepthExceeded { .. } => "instance",
            Self::Config { .. } => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let data_error = PlayerError::AnimationNotFound {
            pack: "pack".to_string(),
            anim: "anim".to_string(),
        };
        assert_eq!(data_error.category(), "data");
        assert_eq!(data_error.to_string(), "Animation not found: pack/anim");

        let nesting = PlayerError::InstanceDepthExceeded { depth: 9, limit: 8 };
        assert_eq!(nesting.category(), "instance");
    }
}
