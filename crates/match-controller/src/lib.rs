//! Match Controller Service Library
//!
//! This library provides the core functionality for the Match Controller -
//! a WebSocket matchmaking server that pairs concurrently connected clients
//! in strict arrival order and books a shared virtual meeting for each pair:
//!
//! - FIFO waiting queue with atomic pair extraction
//! - Matchmaker actor that owns all queue state (single-writer model)
//! - One provisioning task per formed pair, so a slow booking call never
//!   blocks matchmaking progress for unrelated clients
//! - Liveness-checked outcome delivery (disconnected clients are skipped
//!   silently, never errored on)
//!
//! # Architecture
//!
//! ```text
//! WebSocket connection task (one per client)
//! ├── first frame -> ClientArrived -> MatchmakerActor
//! ├── socket close -> ClientDisconnected -> MatchmakerActor
//! └── drains outbound channel -> client
//!
//! MatchmakerActor (singleton)
//! ├── owns the WaitingQueue exclusively
//! ├── pairs the two oldest clients on arrival
//! └── spawns one provisioning task per Pair
//!     └── MeetingProvisioner -> OutcomeDispatcher -> both members
//! ```
//!
//! # Key Design Decisions
//!
//! - **Queue linearizability by ownership**: the queue is a plain owned
//!   container inside the actor; all mutation is serialized through the
//!   actor mailbox, never a shared lock.
//! - **Disconnects never cancel provisioning**: the external booking side
//!   effect cannot be un-created cheaply, so delivery re-checks connection
//!   liveness at send time instead.
//! - **Atomic outcome per pair**: both members get a link or both get the
//!   failure shape, never a mix.
//!
//! # Modules
//!
//! - [`actors`] - Matchmaker actor (handle + message loop)
//! - [`config`] - Service configuration from environment
//! - [`connection`] - Client identity and connection handles
//! - [`dispatcher`] - Outcome delivery to pair members
//! - [`provisioner`] - Meeting provisioning adapter (Nylas)
//! - [`queue`] - FIFO waiting queue
//! - [`transport`] - WebSocket ingress

pub mod actors;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod errors;
pub mod observability;
pub mod provisioner;
pub mod queue;
pub mod transport;
