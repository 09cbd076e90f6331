//! Nylas v3 calendar booking client.
//!
//! Books one calendar event per pair with Google Meet conferencing
//! autocreated, then extracts the meeting URL from the response. The event
//! window starts at invocation time and runs for the configured duration;
//! both parties are added as participants.
//!
//! # Security
//!
//! The API key is stored as `SecretString` and never logged. HTTP timeouts
//! prevent a hung booking call from pinning its provisioning task forever.

use super::{MeetingProvisioner, ProvisionError};
use crate::connection::ClientProfile;

use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default connection timeout for the HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the Nylas booking client.
#[derive(Clone)]
pub struct NylasSettings {
    /// API base URL (default `https://api.us.nylas.com`; overridable for tests).
    pub base_url: String,
    /// Grant under which events are created.
    pub grant_id: String,
    /// Target calendar.
    pub calendar_id: String,
    /// Bearer token for the Nylas API.
    pub api_key: SecretString,
    /// Fixed meeting duration.
    pub meeting_duration: Duration,
    /// Whole-request timeout for the booking call.
    pub http_timeout: Duration,
}

/// Custom Debug implementation that redacts the API key.
impl fmt::Debug for NylasSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NylasSettings")
            .field("base_url", &self.base_url)
            .field("grant_id", &self.grant_id)
            .field("calendar_id", &self.calendar_id)
            .field("api_key", &"[REDACTED]")
            .field("meeting_duration", &self.meeting_duration)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Event creation request body (Nylas v3 `POST /events`).
#[derive(Debug, Serialize)]
struct EventRequest<'a> {
    title: String,
    status: &'static str,
    busy: bool,
    participants: Vec<Participant<'a>>,
    when: TimeWindow,
    location: &'static str,
    conferencing: Conferencing,
}

#[derive(Debug, Serialize)]
struct Participant<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct TimeWindow {
    start_time: i64,
    end_time: i64,
}

#[derive(Debug, Serialize)]
struct Conferencing {
    provider: &'static str,
    autocreate: Autocreate,
}

/// Serializes as `{}`; Nylas fills in the Meet details.
#[derive(Debug, Serialize)]
struct Autocreate {}

/// The subset of the event response we read.
#[derive(Debug, Deserialize)]
struct EventResponse {
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    #[serde(default)]
    conferencing: Option<EventConferencing>,
}

#[derive(Debug, Deserialize)]
struct EventConferencing {
    #[serde(default)]
    details: Option<ConferencingDetails>,
}

#[derive(Debug, Deserialize)]
struct ConferencingDetails {
    #[serde(default)]
    url: Option<String>,
}

/// Nylas-backed meeting provisioner.
pub struct NylasProvisioner {
    http_client: reqwest::Client,
    settings: NylasSettings,
}

impl NylasProvisioner {
    /// Create a provisioner with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Transport`] if the HTTP client cannot be
    /// constructed (TLS backend initialization failure).
    pub fn new(settings: NylasSettings) -> Result<Self, ProvisionError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProvisionError::Transport(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    fn events_url(&self) -> String {
        format!(
            "{}/v3/grants/{}/events?calendar_id={}",
            self.settings.base_url, self.settings.grant_id, self.settings.calendar_id
        )
    }
}

#[async_trait]
impl MeetingProvisioner for NylasProvisioner {
    async fn provision(
        &self,
        first: &ClientProfile,
        second: &ClientProfile,
    ) -> Result<String, ProvisionError> {
        let start_time = chrono::Utc::now().timestamp();
        let end_time = start_time + self.settings.meeting_duration.as_secs() as i64;

        let event = EventRequest {
            title: format!("Meeting between {} and {}", first.name, second.name),
            status: "confirmed",
            busy: true,
            participants: vec![
                Participant {
                    email: &first.email,
                },
                Participant {
                    email: &second.email,
                },
            ],
            when: TimeWindow {
                start_time,
                end_time,
            },
            location: "Virtual",
            conferencing: Conferencing {
                provider: "Google Meet",
                autocreate: Autocreate {},
            },
        };

        debug!(
            target: "mm.provisioner",
            calendar_id = %self.settings.calendar_id,
            start_time,
            end_time,
            "Creating calendar event"
        );

        let response = self
            .http_client
            .post(self.events_url())
            .bearer_auth(self.settings.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&event)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "mm.provisioner", error = %e, "Event creation request failed");
                ProvisionError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                target: "mm.provisioner",
                status = status.as_u16(),
                "Event creation rejected by booking API"
            );
            return Err(ProvisionError::Status(status.as_u16()));
        }

        let body: EventResponse = response.json().await.map_err(|e| {
            warn!(target: "mm.provisioner", error = %e, "Event response could not be decoded");
            ProvisionError::MalformedResponse(e.to_string())
        })?;

        let link = body
            .data
            .conferencing
            .and_then(|c| c.details)
            .and_then(|d| d.url)
            .ok_or(ProvisionError::MissingConferencing)?;

        info!(target: "mm.provisioner", "Meeting link provisioned");
        Ok(link)
    }
}
