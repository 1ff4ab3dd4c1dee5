use crate::types::ActorId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stale actor reference: {actor}")]
    StaleActorReference { actor: ActorId },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Zone '{name}' not found")]
    UnknownZone { name: String },

    #[error("Team '{name}' not found")]
    UnknownTeam { name: String },

    #[error("Session is not active")]
    SessionNotActive,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
