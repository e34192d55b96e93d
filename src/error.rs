//! Domain error taxonomy shared by every service.
//!
//! Each variant carries the offending entity and the rule that was violated,
//! so a presentation layer can render a message without re-deriving the
//! reason.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid {entity}: {reason}")]
    Validation {
        entity: &'static str,
        reason: String,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("caller {caller} forbidden: {reason}")]
    Forbidden { caller: String, reason: String },

    #[error("{kind} {id} is {state}; cannot {operation}")]
    InvalidState {
        kind: &'static str,
        id: String,
        state: String,
        operation: &'static str,
    },

    #[error("boat {boat_id} has no price set for places: {missing:?}")]
    IncompletePricing {
        boat_id: String,
        missing: Vec<String>,
    },

    #[error("conflict on {key}: {reason}")]
    Conflict { key: String, reason: String },

    #[error("storage failure")]
    Store(#[from] sled::Error),

    #[error("corrupt record at {key}: {detail}")]
    Corrupt { key: String, detail: String },
}

impl Error {
    pub(crate) fn validation(entity: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            entity,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn forbidden(caller: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Forbidden {
            caller: caller.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(
        kind: &'static str,
        id: impl Into<String>,
        state: impl Into<String>,
        operation: &'static str,
    ) -> Self {
        Error::InvalidState {
            kind,
            id: id.into(),
            state: state.into(),
            operation,
        }
    }

    pub(crate) fn conflict(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Conflict {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
