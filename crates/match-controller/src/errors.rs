//! Match Controller error types.
//!
//! Internal details are logged server-side but never exposed to clients;
//! the only client-visible failure is the generic failure outcome shape.

use thiserror::Error;

/// Match Controller error type.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The matchmaker actor is no longer running (mailbox closed).
    #[error("Matchmaker is not running")]
    MailboxClosed,

    /// The matchmaker is draining (graceful shutdown), no new arrivals.
    #[error("Matchmaker is draining")]
    Draining,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn display_formatting() {
        assert_eq!(
            format!("{}", MatchError::MailboxClosed),
            "Matchmaker is not running"
        );
        assert_eq!(format!("{}", MatchError::Draining), "Matchmaker is draining");
        assert_eq!(
            format!("{}", MatchError::Config("missing var".to_string())),
            "Configuration error: missing var"
        );
    }
}
