//! Outcome delivery to the two members of a pair.
//!
//! Delivery is performed independently per member: a dead connection on one
//! side never suppresses delivery to the other. Liveness is checked at send
//! time through the connection handle, not cached from pair-formation time.
//! [`deliver`] consumes the [`Pair`], so each pairing attempt is delivered
//! at most once by construction.

use crate::connection::{Client, ClientProfile, ConnectionClosed, OutcomeMessage};
use crate::observability::metrics;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Two clients dequeued together for one meeting.
///
/// Exists only for the duration of the provisioning call and outcome
/// delivery; it has no identity afterward and is never re-queued.
#[derive(Debug)]
pub struct Pair {
    /// The older member by arrival order.
    pub first: Client,
    /// The younger member by arrival order.
    pub second: Client,
    /// When the two were dequeued together.
    pub formed_at: DateTime<Utc>,
}

impl Pair {
    /// Form a pair from the two oldest dequeued clients.
    #[must_use]
    pub fn new(first: Client, second: Client) -> Self {
        Self {
            first,
            second,
            formed_at: Utc::now(),
        }
    }
}

/// Result of provisioning for a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingOutcome {
    /// A meeting was booked; both members get the link.
    Booked {
        /// The shared meeting URL.
        link: String,
    },
    /// Provisioning failed; both members get the generic failure shape.
    Failed,
}

/// Deliver the outcome to both members of the pair.
///
/// Each member either gets the link plus the other party's profile, or the
/// failure shape - never a mix for the same outcome. A member whose
/// connection has since closed is skipped silently.
pub fn deliver(pair: Pair, outcome: &MeetingOutcome) {
    let Pair { first, second, .. } = pair;
    let first_profile = first.profile.clone();
    let second_profile = second.profile.clone();

    deliver_to(&first, second_profile, outcome);
    deliver_to(&second, first_profile, outcome);
}

fn deliver_to(member: &Client, counterpart: ClientProfile, outcome: &MeetingOutcome) {
    let message = match outcome {
        MeetingOutcome::Booked { link } => OutcomeMessage::booked(link.clone(), counterpart),
        MeetingOutcome::Failed => OutcomeMessage::failed(),
    };

    match member.handle.send(message) {
        Ok(()) => {
            metrics::record_outcome_delivered();
            info!(
                target: "mm.dispatcher",
                client_id = %member.id,
                error = matches!(outcome, MeetingOutcome::Failed),
                "Outcome delivered"
            );
        }
        Err(ConnectionClosed) => {
            // Not an error: the member disconnected after being dequeued.
            metrics::record_outcome_skipped();
            debug!(
                target: "mm.dispatcher",
                client_id = %member.id,
                "Connection gone at delivery time, outcome skipped"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionHandle, OutcomeMessage};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn client(name: &str) -> (Client, UnboundedReceiver<OutcomeMessage>) {
        let (handle, receiver) = ConnectionHandle::new();
        let client = Client::new(
            ClientProfile {
                name: name.to_string(),
                email: format!("{name}@example.com"),
            },
            handle,
        );
        (client, receiver)
    }

    #[test]
    fn success_carries_cross_referenced_profiles() {
        let (ann, mut ann_rx) = client("ann");
        let (bea, mut bea_rx) = client("bea");
        let pair = Pair::new(ann, bea);

        deliver(
            pair,
            &MeetingOutcome::Booked {
                link: "https://meet.example/xyz".to_string(),
            },
        );

        let to_ann = ann_rx.try_recv().expect("ann gets a message");
        let to_bea = bea_rx.try_recv().expect("bea gets a message");

        assert_eq!(to_ann.link.as_deref(), Some("https://meet.example/xyz"));
        assert!(!to_ann.error);
        assert_eq!(to_ann.matched_with.expect("counterpart").name, "bea");

        assert_eq!(to_bea.link.as_deref(), Some("https://meet.example/xyz"));
        assert!(!to_bea.error);
        assert_eq!(to_bea.matched_with.expect("counterpart").name, "ann");
    }

    #[test]
    fn failure_sends_the_same_shape_to_both() {
        let (ann, mut ann_rx) = client("ann");
        let (bea, mut bea_rx) = client("bea");
        let pair = Pair::new(ann, bea);

        deliver(pair, &MeetingOutcome::Failed);

        for rx in [&mut ann_rx, &mut bea_rx] {
            let message = rx.try_recv().expect("both get the failure shape");
            assert_eq!(message, OutcomeMessage::failed());
        }
    }

    #[test]
    fn dead_member_does_not_suppress_the_other() {
        let (ann, ann_rx) = client("ann");
        let (bea, mut bea_rx) = client("bea");
        drop(ann_rx); // ann disconnected after being dequeued

        let pair = Pair::new(ann, bea);
        deliver(
            pair,
            &MeetingOutcome::Booked {
                link: "https://meet.example/xyz".to_string(),
            },
        );

        let to_bea = bea_rx.try_recv().expect("bea still gets her outcome");
        assert_eq!(to_bea.matched_with.expect("counterpart").name, "ann");
    }
}
