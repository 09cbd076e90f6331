//! Match Controller configuration.
//!
//! Configuration is loaded from environment variables. The Nylas API key is
//! redacted in Debug output.

use crate::provisioner::NylasSettings;

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default WebSocket bind address.
pub const DEFAULT_WS_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default health endpoint bind address.
pub const DEFAULT_HEALTH_BIND_ADDRESS: &str = "0.0.0.0:8081";

/// Default Nylas API base URL.
pub const DEFAULT_NYLAS_API_BASE_URL: &str = "https://api.us.nylas.com";

/// Default booked meeting duration in minutes.
pub const DEFAULT_MEETING_DURATION_MINUTES: u64 = 45;

/// Default whole-request timeout for the provisioning call in seconds.
pub const DEFAULT_PROVISION_TIMEOUT_SECONDS: u64 = 30;

/// Default instance ID prefix.
pub const DEFAULT_MM_ID_PREFIX: &str = "mm";

/// Match Controller configuration.
///
/// Loaded from environment variables with sensible defaults. The API key is
/// redacted in Debug output.
#[derive(Clone)]
pub struct Config {
    /// Nylas API key (bearer token).
    /// Protected by `SecretString` to prevent accidental logging.
    pub nylas_api_key: SecretString,

    /// Nylas grant under which meetings are booked.
    pub nylas_grant_id: String,

    /// Calendar that receives the booked events.
    pub google_calendar_id: String,

    /// Nylas API base URL (default: `https://api.us.nylas.com`).
    pub nylas_api_base_url: String,

    /// WebSocket server bind address (default: "0.0.0.0:3000").
    pub ws_bind_address: String,

    /// Health endpoint bind address (default: "0.0.0.0:8081").
    pub health_bind_address: String,

    /// Unique identifier for this instance.
    pub mm_id: String,

    /// Booked meeting duration in minutes (default: 45).
    pub meeting_duration_minutes: u64,

    /// Provisioning call timeout in seconds (default: 30).
    pub provision_timeout_seconds: u64,
}

/// Custom Debug implementation that redacts the API key.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("nylas_api_key", &"[REDACTED]")
            .field("nylas_grant_id", &self.nylas_grant_id)
            .field("google_calendar_id", &self.google_calendar_id)
            .field("nylas_api_base_url", &self.nylas_api_base_url)
            .field("ws_bind_address", &self.ws_bind_address)
            .field("health_bind_address", &self.health_bind_address)
            .field("mm_id", &self.mm_id)
            .field("meeting_duration_minutes", &self.meeting_duration_minutes)
            .field(
                "provision_timeout_seconds",
                &self.provision_timeout_seconds,
            )
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let nylas_api_key = SecretString::from(
            vars.get("NYLAS_API_KEY")
                .ok_or_else(|| ConfigError::MissingEnvVar("NYLAS_API_KEY".to_string()))?
                .clone(),
        );

        let nylas_grant_id = vars
            .get("NYLAS_GRANT_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("NYLAS_GRANT_ID".to_string()))?
            .clone();

        let google_calendar_id = vars
            .get("GOOGLE_CALENDAR_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_CALENDAR_ID".to_string()))?
            .clone();

        let nylas_api_base_url = vars
            .get("NYLAS_API_BASE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_NYLAS_API_BASE_URL.to_string());

        let ws_bind_address = vars
            .get("MM_WS_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_WS_BIND_ADDRESS.to_string());

        let health_bind_address = vars
            .get("MM_HEALTH_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HEALTH_BIND_ADDRESS.to_string());

        let meeting_duration_minutes = vars
            .get("MM_MEETING_DURATION_MINUTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MEETING_DURATION_MINUTES);

        if meeting_duration_minutes == 0 {
            return Err(ConfigError::InvalidValue(
                "MM_MEETING_DURATION_MINUTES must be at least 1".to_string(),
            ));
        }

        let provision_timeout_seconds = vars
            .get("MM_PROVISION_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PROVISION_TIMEOUT_SECONDS);

        // Generate instance ID
        let mm_id = vars.get("MM_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_MM_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            nylas_api_key,
            nylas_grant_id,
            google_calendar_id,
            nylas_api_base_url,
            ws_bind_address,
            health_bind_address,
            mm_id,
            meeting_duration_minutes,
            provision_timeout_seconds,
        })
    }

    /// Build the provisioner settings from this configuration.
    #[must_use]
    pub fn nylas_settings(&self) -> NylasSettings {
        NylasSettings {
            base_url: self.nylas_api_base_url.clone(),
            grant_id: self.nylas_grant_id.clone(),
            calendar_id: self.google_calendar_id.clone(),
            api_key: self.nylas_api_key.clone(),
            meeting_duration: Duration::from_secs(self.meeting_duration_minutes * 60),
            http_timeout: Duration::from_secs(self.provision_timeout_seconds),
        }
    }
}
