//! Message types for the matchmaker actor.
//!
//! All communication with the matchmaker uses typed message passing via
//! `tokio::sync::mpsc`. Request-reply patterns use `tokio::sync::oneshot`.

use crate::connection::{Client, ClientId};
use crate::errors::MatchError;
use tokio::sync::oneshot;

/// Messages sent to the `MatchmakerActor`.
#[derive(Debug)]
pub enum MatchmakerMessage {
    /// A newly connected client announced itself and wants to be matched.
    ClientArrived {
        client: Client,
        /// Response channel; `Err` means the arrival was rejected
        /// (e.g. the matchmaker is draining) and the client was not enqueued.
        respond_to: oneshot::Sender<Result<(), MatchError>>,
    },

    /// A client's connection closed. Fire-and-forget: if the client was
    /// already dequeued for pairing, this is a no-op and delivery-time
    /// liveness checks take over.
    ClientDisconnected { client_id: ClientId },

    /// Get current matchmaker status (for health and tests).
    GetStatus {
        /// Response channel for the status snapshot.
        respond_to: oneshot::Sender<MatchmakerStatus>,
    },

    /// Stop accepting arrivals and cancel the actor.
    Shutdown {
        /// Response channel for confirmation.
        respond_to: oneshot::Sender<()>,
    },
}

/// Point-in-time snapshot of matchmaker state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchmakerStatus {
    /// Clients currently waiting in the queue.
    pub waiting: usize,
    /// Pairs with a provisioning call still in flight.
    pub pairs_in_flight: usize,
    /// Total pairs formed since startup.
    pub pairs_formed: u64,
    /// Whether the matchmaker has stopped accepting arrivals.
    pub is_draining: bool,
}
