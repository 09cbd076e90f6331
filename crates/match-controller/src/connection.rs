//! Client identity and connection handles.
//!
//! The transport layer owns the socket itself; the rest of the system only
//! sees a [`ConnectionHandle`], which can send one structured message to the
//! client and reports liveness at the moment of the send. A handle goes dead
//! when the connection task drops its receiving end, so liveness is always
//! current rather than cached from pairing time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for one client connection.
///
/// A new id is minted per connection; clients are anonymous and transient,
/// so there is no identity that survives a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Mint a fresh client id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Client-supplied profile, received as the first frame on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    /// Display name, used in the booked meeting title.
    pub name: String,
    /// Contact email, added as a required meeting participant.
    pub email: String,
}

/// Final message delivered to each resolved client.
///
/// Success carries the meeting link and the counterpart's profile; failure
/// carries neither. Serialized with camelCase field names on the wire
/// (`matchedWith`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeMessage {
    /// Meeting URL on success, `null` on failure.
    pub link: Option<String>,
    /// Whether the pairing attempt failed.
    pub error: bool,
    /// The other party's profile on success, `null` on failure.
    pub matched_with: Option<ClientProfile>,
}

impl OutcomeMessage {
    /// Build the success shape for one pair member.
    #[must_use]
    pub fn booked(link: String, counterpart: ClientProfile) -> Self {
        Self {
            link: Some(link),
            error: false,
            matched_with: Some(counterpart),
        }
    }

    /// Build the generic failure shape. No diagnostic detail is exposed.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            link: None,
            error: true,
            matched_with: None,
        }
    }
}

/// Error returned when sending to a client whose connection has closed.
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionClosed;

/// Sending half of a client's outbound channel.
///
/// Clonable; the connection task holds the receiving half and forwards
/// messages onto the socket. Once that task exits (socket closed), every
/// send fails with [`ConnectionClosed`] and [`is_live`](Self::is_live)
/// returns false.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    sender: mpsc::UnboundedSender<OutcomeMessage>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver the connection task drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutcomeMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Whether the client's connection is still open right now.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue one message for delivery to the client.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionClosed`] if the connection task has exited.
    pub fn send(&self, message: OutcomeMessage) -> Result<(), ConnectionClosed> {
        self.sender.send(message).map_err(|_| ConnectionClosed)
    }
}

/// One waiting or paired party.
///
/// Created when the first profile frame arrives on a new connection;
/// discarded when the connection closes or its pairing attempt concludes.
/// Never reused across two pairings.
#[derive(Debug, Clone)]
pub struct Client {
    /// Connection-scoped identifier.
    pub id: ClientId,
    /// Client-supplied profile.
    pub profile: ClientProfile,
    /// Outbound handle for the final message.
    pub handle: ConnectionHandle,
    /// When the profile frame was received.
    pub connected_at: DateTime<Utc>,
}

impl Client {
    /// Create a client for a freshly announced connection.
    #[must_use]
    pub fn new(profile: ClientProfile, handle: ConnectionHandle) -> Self {
        Self {
            id: ClientId::new(),
            profile,
            handle,
            connected_at: Utc::now(),
        }
    }
}
