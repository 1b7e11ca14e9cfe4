//! Error kinds surfaced by the affiliation core.
//!
//! Every failure is fail-fast: the operation that hits one of these returns
//! immediately and leaves shared state untouched. An unreachable pair of
//! agents is *not* an error; it is an infinite distance
//! (see [`crate::distance::UNREACHABLE`]).

use thiserror::Error;

use crate::agent::AgentId;

/// Errors returned by agent construction, index operations and search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AffinityError {
    /// An affiliation vector entry was outside `{0, 1}`.
    #[error("affiliation vector entry at position {position} is {value}, expected 0 or 1")]
    InvalidVector {
        /// Offending position.
        position: usize,
        /// Offending value.
        value: u8,
    },

    /// The agent is not part of the affiliation index it was looked up in.
    #[error("agent {0} is not attached to the affiliation index")]
    DetachedAgent(AgentId),

    /// Two affiliation vectors (or an agent and the index) differ in length.
    #[error("affiliation vector length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// Length required by the other operand.
        expected: usize,
        /// Length actually found.
        found: usize,
    },

    /// A utility model tag did not name any known model.
    #[error("unknown utility model tag {0:?}")]
    UnknownModel(String),

    /// Two ingested agents carried the same identifier.
    #[error("agent identifier {0} is already present in the index")]
    DuplicateAgent(AgentId),

    /// An idea position beyond the index's idea count.
    #[error("idea {idea} is out of range for {ideas} ideas")]
    IdeaOutOfRange {
        /// Requested position.
        idea: usize,
        /// Number of ideas in the index.
        ideas: usize,
    },

    /// A generator or configuration parameter was rejected.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, AffinityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let e = AffinityError::InvalidVector { position: 3, value: 2 };
        assert!(e.to_string().contains("position 3"));
        assert_eq!(
            AffinityError::DetachedAgent(7).to_string(),
            "agent 7 is not attached to the affiliation index"
        );
        let e = AffinityError::UnknownModel("mil99".into());
        assert!(e.to_string().contains("mil99"));
    }
}
