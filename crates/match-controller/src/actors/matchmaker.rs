//! `MatchmakerActor` - the core pairing state machine.
//!
//! The actor exclusively owns the waiting queue; arrivals and disconnects
//! are serialized through its mailbox, which gives the queue operations
//! their linearizability. When two clients are waiting, the two oldest are
//! dequeued together and one provisioning task is spawned for the pair, so
//! an in-flight booking call never blocks matchmaking for unrelated clients.
//!
//! Per-client states: `Waiting -> Paired -> Resolved`, or
//! `Waiting -> Disconnected` if the connection closes before pairing. A
//! disconnect after dequeue does not cancel provisioning (the external
//! booking cannot be un-created cheaply); the dispatcher skips dead
//! connections at delivery time instead.

use crate::connection::{Client, ClientId};
use crate::dispatcher::{self, MeetingOutcome, Pair};
use crate::errors::MatchError;
use crate::observability::metrics;
use crate::provisioner::MeetingProvisioner;
use crate::queue::WaitingQueue;

use super::messages::{MatchmakerMessage, MatchmakerStatus};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Channel buffer size for the matchmaker mailbox.
const MATCHMAKER_CHANNEL_BUFFER: usize = 1000;

/// Handle to the `MatchmakerActor`.
///
/// This is the public interface for the transport layer and tests. Cloning
/// is cheap; all clones talk to the same actor.
#[derive(Clone)]
pub struct MatchmakerHandle {
    sender: mpsc::Sender<MatchmakerMessage>,
    cancel_token: CancellationToken,
}

impl MatchmakerHandle {
    /// Create a new `MatchmakerActor` and return a handle to it.
    ///
    /// Spawns the actor task and returns immediately.
    #[must_use]
    pub fn new(provisioner: Arc<dyn MeetingProvisioner>) -> Self {
        let (sender, receiver) = mpsc::channel(MATCHMAKER_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = MatchmakerActor::new(receiver, cancel_token.clone(), provisioner);
        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Register a newly announced client for matchmaking.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Draining`] if the matchmaker no longer accepts
    /// arrivals, or [`MatchError::MailboxClosed`] if the actor is gone.
    pub async fn client_arrived(&self, client: Client) -> Result<(), MatchError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MatchmakerMessage::ClientArrived {
                client,
                respond_to: tx,
            })
            .await
            .map_err(|_| MatchError::MailboxClosed)?;

        rx.await.map_err(|_| MatchError::MailboxClosed)?
    }

    /// Notify the matchmaker that a client's connection closed.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MailboxClosed`] if the actor is gone.
    pub async fn client_disconnected(&self, client_id: ClientId) -> Result<(), MatchError> {
        self.sender
            .send(MatchmakerMessage::ClientDisconnected { client_id })
            .await
            .map_err(|_| MatchError::MailboxClosed)
    }

    /// Get a status snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MailboxClosed`] if the actor is gone.
    pub async fn status(&self) -> Result<MatchmakerStatus, MatchError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MatchmakerMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|_| MatchError::MailboxClosed)?;

        rx.await.map_err(|_| MatchError::MailboxClosed)
    }

    /// Initiate graceful shutdown: stop accepting arrivals, cancel the actor.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MailboxClosed`] if the actor is already gone.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MatchmakerMessage::Shutdown { respond_to: tx })
            .await
            .map_err(|_| MatchError::MailboxClosed)?;

        rx.await.map_err(|_| MatchError::MailboxClosed)
    }

    /// Cancel the actor immediately.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token for tasks that should stop with the matchmaker.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// The `MatchmakerActor` implementation.
///
/// Owns the waiting queue and runs the message loop.
struct MatchmakerActor {
    /// Message receiver.
    receiver: mpsc::Receiver<MatchmakerMessage>,
    /// Cancellation token.
    cancel_token: CancellationToken,
    /// The waiting queue. Exclusively owned; never shared or locked.
    queue: WaitingQueue,
    /// Booking adapter, shared with spawned provisioning tasks.
    provisioner: Arc<dyn MeetingProvisioner>,
    /// Whether new arrivals are accepted.
    accepting_new: bool,
    /// Pairs with provisioning still in flight (decremented by the tasks).
    pairs_in_flight: Arc<AtomicUsize>,
    /// Total pairs formed since startup.
    pairs_formed: u64,
}

impl MatchmakerActor {
    fn new(
        receiver: mpsc::Receiver<MatchmakerMessage>,
        cancel_token: CancellationToken,
        provisioner: Arc<dyn MeetingProvisioner>,
    ) -> Self {
        Self {
            receiver,
            cancel_token,
            queue: WaitingQueue::new(),
            provisioner,
            accepting_new: true,
            pairs_in_flight: Arc::new(AtomicUsize::new(0)),
            pairs_formed: 0,
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "mm.actor.matchmaker")]
    async fn run(mut self) {
        info!(target: "mm.actor.matchmaker", "MatchmakerActor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "mm.actor.matchmaker",
                        waiting = self.queue.len(),
                        "MatchmakerActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(
                                target: "mm.actor.matchmaker",
                                "MatchmakerActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "mm.actor.matchmaker",
            waiting = self.queue.len(),
            pairs_formed = self.pairs_formed,
            "MatchmakerActor stopped"
        );
    }

    /// Handle a single message. Never awaits: provisioning runs in its own
    /// task so the loop stays responsive to other clients' events.
    fn handle_message(&mut self, message: MatchmakerMessage) {
        match message {
            MatchmakerMessage::ClientArrived { client, respond_to } => {
                let result = self.handle_arrival(client);
                let _ = respond_to.send(result);
            }

            MatchmakerMessage::ClientDisconnected { client_id } => {
                self.handle_disconnect(client_id);
            }

            MatchmakerMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }

            MatchmakerMessage::Shutdown { respond_to } => {
                info!(
                    target: "mm.actor.matchmaker",
                    waiting = self.queue.len(),
                    "Initiating graceful shutdown"
                );
                self.accepting_new = false;
                self.cancel_token.cancel();
                let _ = respond_to.send(());
            }
        }
    }

    /// Enqueue an arrival and pair the two oldest if possible.
    fn handle_arrival(&mut self, client: Client) -> Result<(), MatchError> {
        if !self.accepting_new {
            return Err(MatchError::Draining);
        }

        debug!(
            target: "mm.actor.matchmaker",
            client_id = %client.id,
            name = %client.profile.name,
            "Client enqueued"
        );

        metrics::record_client_arrived();
        self.queue.enqueue(client);
        self.try_form_pair();
        metrics::set_clients_waiting(self.queue.len());

        Ok(())
    }

    /// Remove a disconnected client from the queue if it is still waiting.
    fn handle_disconnect(&mut self, client_id: ClientId) {
        if self.queue.remove(client_id) {
            info!(
                target: "mm.actor.matchmaker",
                client_id = %client_id,
                waiting = self.queue.len(),
                "Client disconnected while waiting, removed from queue"
            );
            metrics::set_clients_waiting(self.queue.len());
        } else {
            // Already dequeued for pairing (or resolved); the dispatcher's
            // send-time liveness check covers this client now.
            debug!(
                target: "mm.actor.matchmaker",
                client_id = %client_id,
                "Disconnect for client not in queue"
            );
        }
    }

    /// Dequeue the two oldest clients and spawn their provisioning task.
    fn try_form_pair(&mut self) {
        let Some((first, second)) = self.queue.dequeue_oldest_two() else {
            return;
        };

        let pair = Pair::new(first, second);
        self.pairs_formed += 1;
        self.pairs_in_flight.fetch_add(1, Ordering::SeqCst);
        metrics::record_pair_formed();

        info!(
            target: "mm.actor.matchmaker",
            first = %pair.first.id,
            second = %pair.second.id,
            pairs_formed = self.pairs_formed,
            "Pair formed, provisioning meeting"
        );

        let provisioner = Arc::clone(&self.provisioner);
        let in_flight = Arc::clone(&self.pairs_in_flight);

        // Exactly one provisioning call per pair. Errors are converted to
        // the failure outcome here and never escape the task.
        tokio::spawn(async move {
            let outcome = match provisioner
                .provision(&pair.first.profile, &pair.second.profile)
                .await
            {
                Ok(link) => MeetingOutcome::Booked { link },
                Err(e) => {
                    warn!(
                        target: "mm.actor.matchmaker",
                        first = %pair.first.id,
                        second = %pair.second.id,
                        error = %e,
                        "Provisioning failed, notifying both members"
                    );
                    metrics::record_provision_failure();
                    MeetingOutcome::Failed
                }
            };

            dispatcher::deliver(pair, &outcome);
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    fn status(&self) -> MatchmakerStatus {
        MatchmakerStatus {
            waiting: self.queue.len(),
            pairs_in_flight: self.pairs_in_flight.load(Ordering::SeqCst),
            pairs_formed: self.pairs_formed,
            is_draining: !self.accepting_new,
        }
    }
}
