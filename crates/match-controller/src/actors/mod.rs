//! Matchmaker actor: handle, message loop, and message types.

mod matchmaker;
mod messages;

pub use matchmaker::MatchmakerHandle;
pub use messages::{MatchmakerMessage, MatchmakerStatus};
