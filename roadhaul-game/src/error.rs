//! Player-action failures.
use thiserror::Error;

/// Why a player request was refused. Refusals never mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("need ${needed}, have ${available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("action not available right now")]
    InvalidState,
    #[error("unknown target: {0}")]
    UnknownTarget(String),
    #[error("already at limit")]
    AlreadyAtLimit,
}

impl ActionError {
    /// Short machine-readable reason code consumed by UI layers.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "poor",
            Self::InvalidState => "not_in_city",
            Self::UnknownTarget(_) => "no_upgrade",
            Self::AlreadyAtLimit => "max",
        }
    }
}

/// Convenience alias for action results.
pub type ActionResult<T = ()> = Result<T, ActionError>;
