//! Error types for the match engine
//!
//! Engine operations (join, leave, teardown) return [`MatchError`] directly so
//! the command layer can tell a refused operation apart from a failure.
//! Application plumbing uses anyhow through the [`Result`] alias.

/// Result type alias for application-level code
pub type Result<T> = anyhow::Result<T>;

/// Result type alias for engine operations
pub type MatchResult<T> = std::result::Result<T, MatchError>;

/// Errors returned by match engine operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Match {match_name} is full ({capacity} players)")]
    CapacityExceeded { match_name: String, capacity: usize },

    #[error("Player {player_id} already joined a game")]
    AlreadyJoined { player_id: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Match not found: {match_name}")]
    MatchNotFound { match_name: String },

    #[error("Match already exists: {match_name}")]
    MatchAlreadyExists { match_name: String },

    #[error("Game {match_name} has already started")]
    AlreadyStarted { match_name: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Internal engine error: {message}")]
    Internal { message: String },
}

impl MatchError {
    /// Whether the error means "the thing you asked about is not there"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MatchError::PlayerNotFound { .. } | MatchError::MatchNotFound { .. }
        )
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        MatchError::Internal {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
