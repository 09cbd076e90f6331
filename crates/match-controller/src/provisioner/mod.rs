//! Meeting provisioning adapter.
//!
//! Wraps the external booking call behind a uniform asynchronous contract:
//! one attempt per pair, no retry, and every failure class normalized to a
//! single opaque [`ProvisionError`] at this boundary. The matchmaker never
//! distinguishes error subtypes; the variants below exist for server-side
//! logging only.

use crate::connection::ClientProfile;

use async_trait::async_trait;
use thiserror::Error;

pub mod nylas;

pub use nylas::{NylasProvisioner, NylasSettings};

/// Why a provisioning attempt failed. Opaque to the matchmaker.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The request never completed (connect failure, timeout).
    #[error("provisioning request failed: {0}")]
    Transport(String),

    /// The booking API returned a non-success status.
    #[error("provisioning API returned status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("provisioning response was malformed: {0}")]
    MalformedResponse(String),

    /// The booked event came back without conferencing details.
    #[error("provisioning response had no conferencing link")]
    MissingConferencing,
}

/// Asynchronous booking contract for one pair.
///
/// Implementations must issue exactly one booking attempt per call, encode a
/// fixed meeting duration, and mark both parties as required attendees.
#[async_trait]
pub trait MeetingProvisioner: Send + Sync {
    /// Book one virtual meeting for the two parties; returns the meeting URL.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] on any failure; the caller treats every
    /// error identically (generic failure outcome, no retry).
    async fn provision(
        &self,
        first: &ClientProfile,
        second: &ClientProfile,
    ) -> Result<String, ProvisionError>;
}
