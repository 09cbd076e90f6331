//! End-to-end pairing flows at the matchmaker handle boundary.
//!
//! These tests use in-memory connections and scripted provisioners, covering
//! the core guarantees: strict FIFO pairing, no double-pairing, clean
//! disconnect handling before and after dequeue, and atomic success/failure
//! outcomes per pair.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use match_controller::actors::MatchmakerHandle;
use match_controller::connection::{Client, ClientProfile, ConnectionHandle, OutcomeMessage};
use match_controller::provisioner::{MeetingProvisioner, ProvisionError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;

/// Always books the same link.
struct FixedLinkProvisioner {
    link: String,
}

#[async_trait]
impl MeetingProvisioner for FixedLinkProvisioner {
    async fn provision(
        &self,
        _first: &ClientProfile,
        _second: &ClientProfile,
    ) -> Result<String, ProvisionError> {
        Ok(self.link.clone())
    }
}

/// Always fails.
struct FailingProvisioner;

#[async_trait]
impl MeetingProvisioner for FailingProvisioner {
    async fn provision(
        &self,
        _first: &ClientProfile,
        _second: &ClientProfile,
    ) -> Result<String, ProvisionError> {
        Err(ProvisionError::Status(502))
    }
}

/// Blocks until released, then books; lets tests interleave disconnects with
/// an in-flight provisioning call.
struct GatedProvisioner {
    gate: watch::Receiver<bool>,
    link: String,
}

#[async_trait]
impl MeetingProvisioner for GatedProvisioner {
    async fn provision(
        &self,
        _first: &ClientProfile,
        _second: &ClientProfile,
    ) -> Result<String, ProvisionError> {
        let mut gate = self.gate.clone();
        while !*gate.borrow() {
            if gate.changed().await.is_err() {
                break;
            }
        }
        Ok(self.link.clone())
    }
}

fn fixed(link: &str) -> Arc<FixedLinkProvisioner> {
    Arc::new(FixedLinkProvisioner {
        link: link.to_string(),
    })
}

fn connect(name: &str) -> (Client, UnboundedReceiver<OutcomeMessage>) {
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

async fn recv(rx: &mut UnboundedReceiver<OutcomeMessage>) -> OutcomeMessage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("outcome within deadline")
        .expect("channel open")
}

async fn assert_no_message(rx: &mut UnboundedReceiver<OutcomeMessage>) {
    let result = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(result.is_err(), "expected no message, got {result:?}");
}

#[tokio::test]
async fn fifo_pairing_first_with_second_third_with_fourth() {
    let matchmaker = MatchmakerHandle::new(fixed("https://meet.example/xyz"));

    let (a, mut a_rx) = connect("a");
    let (b, mut b_rx) = connect("b");
    let (c, mut c_rx) = connect("c");

    matchmaker.client_arrived(a).await.expect("a accepted");
    matchmaker.client_arrived(b).await.expect("b accepted");
    matchmaker.client_arrived(c).await.expect("c accepted");

    // A and B are paired with each other
    let to_a = recv(&mut a_rx).await;
    assert_eq!(to_a.link.as_deref(), Some("https://meet.example/xyz"));
    assert!(!to_a.error);
    assert_eq!(to_a.matched_with.expect("counterpart").name, "b");

    let to_b = recv(&mut b_rx).await;
    assert_eq!(to_b.link.as_deref(), Some("https://meet.example/xyz"));
    assert_eq!(to_b.matched_with.expect("counterpart").name, "a");

    // C keeps waiting until D arrives
    assert_no_message(&mut c_rx).await;
    let status = matchmaker.status().await.expect("status");
    assert_eq!(status.waiting, 1);

    let (d, mut d_rx) = connect("d");
    matchmaker.client_arrived(d).await.expect("d accepted");

    assert_eq!(recv(&mut c_rx).await.matched_with.expect("match").name, "d");
    assert_eq!(recv(&mut d_rx).await.matched_with.expect("match").name, "c");

    let status = matchmaker.status().await.expect("status");
    assert_eq!(status.waiting, 0);
    assert_eq!(status.pairs_formed, 2);

    matchmaker.cancel();
}

#[tokio::test]
async fn provisioning_failure_notifies_both_identically() {
    let matchmaker = MatchmakerHandle::new(Arc::new(FailingProvisioner));

    let (a, mut a_rx) = connect("a");
    let (b, mut b_rx) = connect("b");
    matchmaker.client_arrived(a).await.expect("a accepted");
    matchmaker.client_arrived(b).await.expect("b accepted");

    for rx in [&mut a_rx, &mut b_rx] {
        let message = recv(rx).await;
        assert_eq!(message, OutcomeMessage::failed());
    }

    // No partial state remains: the pair is not re-queued
    let status = matchmaker.status().await.expect("status");
    assert_eq!(status.waiting, 0);

    matchmaker.cancel();
}

#[tokio::test]
async fn disconnect_before_pair_removes_cleanly() {
    let matchmaker = MatchmakerHandle::new(fixed("https://meet.example/xyz"));

    let (a, mut a_rx) = connect("a");
    let a_id = a.id;
    matchmaker.client_arrived(a).await.expect("a accepted");
    matchmaker.client_disconnected(a_id).await.expect("notified");

    let status = matchmaker.status().await.expect("status");
    assert_eq!(status.waiting, 0, "a must be gone from the queue");

    // B then C pair with each other; the departed A receives nothing
    let (b, mut b_rx) = connect("b");
    let (c, mut c_rx) = connect("c");
    matchmaker.client_arrived(b).await.expect("b accepted");
    matchmaker.client_arrived(c).await.expect("c accepted");

    assert_eq!(recv(&mut b_rx).await.matched_with.expect("match").name, "c");
    assert_eq!(recv(&mut c_rx).await.matched_with.expect("match").name, "b");
    assert_no_message(&mut a_rx).await;

    matchmaker.cancel();
}

#[tokio::test]
async fn disconnect_after_dequeue_still_resolves_survivor() {
    let (release, gate) = watch::channel(false);
    let matchmaker = MatchmakerHandle::new(Arc::new(GatedProvisioner {
        gate,
        link: "https://meet.example/xyz".to_string(),
    }));

    let (a, a_rx) = connect("a");
    let (b, mut b_rx) = connect("b");
    let a_id = a.id;

    matchmaker.client_arrived(a).await.expect("a accepted");
    matchmaker.client_arrived(b).await.expect("b accepted");

    // The pair is formed and provisioning is in flight
    let status = matchmaker.status().await.expect("status");
    assert_eq!(status.waiting, 0);
    assert_eq!(status.pairs_formed, 1);

    // A disconnects mid-provisioning; the call is not cancelled
    drop(a_rx);
    matchmaker.client_disconnected(a_id).await.expect("notified");

    // Unrelated clients keep being matched while the first call is blocked
    let (c, mut c_rx) = connect("c");
    let (d, mut d_rx) = connect("d");
    matchmaker.client_arrived(c).await.expect("c accepted");
    matchmaker.client_arrived(d).await.expect("d accepted");
    assert_eq!(recv(&mut c_rx).await.matched_with.expect("match").name, "d");
    assert_eq!(recv(&mut d_rx).await.matched_with.expect("match").name, "c");

    // Release the gate: B still gets a full success outcome
    release.send(true).expect("gate receiver alive");
    let to_b = recv(&mut b_rx).await;
    assert_eq!(to_b.link.as_deref(), Some("https://meet.example/xyz"));
    assert_eq!(to_b.matched_with.expect("counterpart").name, "a");

    matchmaker.cancel();
}

#[tokio::test]
async fn concurrent_arrivals_never_double_pair() {
    let matchmaker = MatchmakerHandle::new(fixed("https://meet.example/xyz"));

    let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let mut receivers = Vec::new();
    let mut tasks = Vec::new();

    for name in names {
        let (client, receiver) = connect(name);
        receivers.push((name.to_string(), receiver));
        let handle = matchmaker.clone();
        tasks.push(tokio::spawn(async move {
            handle.client_arrived(client).await
        }));
    }
    for task in tasks {
        task.await.expect("arrival task").expect("accepted");
    }

    // Everyone resolves exactly once and the partner relation is a perfect
    // matching: symmetric, irreflexive, and covering all eight clients.
    let mut partner_of: HashMap<String, String> = HashMap::new();
    for (name, mut rx) in receivers {
        let message = recv(&mut rx).await;
        assert!(!message.error);
        let partner = message.matched_with.expect("counterpart").name;
        assert_ne!(partner, name, "a client cannot match itself");
        partner_of.insert(name.clone(), partner);
        assert_no_message(&mut rx).await;
    }

    assert_eq!(partner_of.len(), names.len());
    for (name, partner) in &partner_of {
        assert_eq!(
            partner_of.get(partner),
            Some(name),
            "partner relation must be symmetric"
        );
    }

    let status = matchmaker.status().await.expect("status");
    assert_eq!(status.waiting, 0);
    assert_eq!(status.pairs_formed, 4);

    matchmaker.cancel();
}
