//! Crate-wide error type.
//!
//! All collaborator failures (transport, operator channel, payment provider,
//! catalog backend) flatten into [`BotError`]; best-effort paths (artifact
//! deletion, scheduled-task revocation) never produce one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Operator notification failed: {0}")]
    Notify(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BotResult<T> = Result<T, BotError>;

impl BotError {
    pub fn transport(e: impl std::fmt::Display) -> Self {
        BotError::Transport(e.to_string())
    }

    pub fn payment(e: impl std::fmt::Display) -> Self {
        BotError::Payment(e.to_string())
    }

    pub fn catalog(e: impl std::fmt::Display) -> Self {
        BotError::Catalog(e.to_string())
    }
}
