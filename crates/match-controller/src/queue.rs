//! FIFO waiting queue.
//!
//! The queue is owned exclusively by the matchmaker actor; every mutation is
//! serialized through the actor mailbox, which is what makes the operations
//! here linearizable without a lock. Nothing outside the actor ever holds a
//! reference to it.

use crate::connection::{Client, ClientId};
use std::collections::VecDeque;

/// One queue entry: a client plus its arrival sequence number.
#[derive(Debug)]
struct WaitingClient {
    arrival_seq: u64,
    client: Client,
}

/// Ordered collection of waiting clients, FIFO by arrival.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    entries: VecDeque<WaitingClient>,
    next_seq: u64,
}

impl WaitingQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a client to the tail.
    ///
    /// # Panics
    ///
    /// Panics if the client is already present. A double-enqueue is a
    /// programming invariant violation, not a runtime condition to recover
    /// from: the transport enqueues each connection exactly once.
    pub fn enqueue(&mut self, client: Client) {
        assert!(
            !self.entries.iter().any(|w| w.client.id == client.id),
            "client {} enqueued twice",
            client.id
        );

        let arrival_seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(WaitingClient {
            arrival_seq,
            client,
        });
    }

    /// Remove and return the two oldest clients, or `None` (queue unchanged)
    /// if fewer than two are waiting.
    ///
    /// Check-and-remove is atomic with respect to all other queue operations
    /// because the owning actor processes one message at a time: a third
    /// concurrent arrival cannot be swept into the pair, and two dequeues can
    /// never return overlapping clients.
    pub fn dequeue_oldest_two(&mut self) -> Option<(Client, Client)> {
        if self.entries.len() < 2 {
            return None;
        }
        let first = self.entries.pop_front()?;
        let second = self.entries.pop_front()?;
        Some((first.client, second.client))
    }

    /// Remove a client if present; returns whether it was found.
    ///
    /// Absence is a no-op, not an error: a disconnect may arrive after the
    /// client was already dequeued for pairing. Relative order of the
    /// remaining entries is preserved.
    pub fn remove(&mut self, client_id: ClientId) -> bool {
        match self.entries.iter().position(|w| w.client.id == client_id) {
            Some(index) => self.entries.remove(index).is_some(),
            None => false,
        }
    }

    /// Number of waiting clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arrival sequence number of the oldest waiting client, if any.
    #[must_use]
    pub fn oldest_arrival_seq(&self) -> Option<u64> {
        self.entries.front().map(|w| w.arrival_seq)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::connection::{ClientProfile, ConnectionHandle};

    fn client(name: &str) -> Client {
        let (handle, receiver) = ConnectionHandle::new();
        // Liveness is irrelevant to queue semantics; leak the receiver so the
        // handle stays live for the test.
        std::mem::forget(receiver);
        Client::new(
            ClientProfile {
                name: name.to_string(),
                email: format!("{name}@example.com"),
            },
            handle,
        )
    }

    #[test]
    fn dequeue_returns_none_when_fewer_than_two() {
        let mut queue = WaitingQueue::new();
        assert!(queue.dequeue_oldest_two().is_none());

        queue.enqueue(client("ann"));
        assert!(queue.dequeue_oldest_two().is_none());
        assert_eq!(queue.len(), 1, "failed dequeue must leave queue unchanged");
    }

    #[test]
    fn dequeue_takes_exactly_the_two_oldest() {
        let mut queue = WaitingQueue::new();
        let (ann, bea, cal) = (client("ann"), client("bea"), client("cal"));
        let (ann_id, bea_id, cal_id) = (ann.id, bea.id, cal.id);

        queue.enqueue(ann);
        queue.enqueue(bea);
        queue.enqueue(cal);

        let (first, second) = queue.dequeue_oldest_two().expect("three waiting");
        assert_eq!(first.id, ann_id);
        assert_eq!(second.id, bea_id);
        assert_eq!(queue.len(), 1);
        assert!(queue.remove(cal_id), "third client must still be waiting");
    }

    #[test]
    fn remove_absent_client_is_noop() {
        let mut queue = WaitingQueue::new();
        let ann = client("ann");
        let stranger = client("stranger");
        let stranger_id = stranger.id;
        queue.enqueue(ann);

        assert!(!queue.remove(stranger_id));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut queue = WaitingQueue::new();
        let (ann, bea, cal, dee) = (client("ann"), client("bea"), client("cal"), client("dee"));
        let (ann_id, bea_id, cal_id, dee_id) = (ann.id, bea.id, cal.id, dee.id);

        queue.enqueue(ann);
        queue.enqueue(bea);
        queue.enqueue(cal);
        queue.enqueue(dee);

        assert!(queue.remove(bea_id));

        let (first, second) = queue.dequeue_oldest_two().expect("three remain");
        assert_eq!(first.id, ann_id);
        assert_eq!(second.id, cal_id);
        assert!(queue.remove(dee_id));
    }

    #[test]
    fn arrival_sequence_is_monotonic_across_removals() {
        let mut queue = WaitingQueue::new();
        let ann = client("ann");
        let ann_id = ann.id;
        queue.enqueue(ann);
        assert_eq!(queue.oldest_arrival_seq(), Some(0));

        assert!(queue.remove(ann_id));
        queue.enqueue(client("bea"));
        assert_eq!(
            queue.oldest_arrival_seq(),
            Some(1),
            "sequence numbers are never reused"
        );
    }

    #[test]
    #[should_panic(expected = "enqueued twice")]
    fn double_enqueue_panics() {
        let mut queue = WaitingQueue::new();
        let ann = client("ann");
        let dup = ann.clone();
        queue.enqueue(ann);
        queue.enqueue(dup);
    }
}
