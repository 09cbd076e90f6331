//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use them for all
//! sensitive values: API keys, bearer tokens, and credentials passed to
//! external booking providers.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` while holding a secret gets safe logging behavior for
//! free. Accessing the actual value requires an explicit call to
//! [`ExposeSecret::expose_secret`].
//!
//! Secrets are zeroized on drop, so sensitive data does not linger in
//! memory after use.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct ProviderCredentials {
//!     grant_id: String,
//!     api_key: SecretString,  // Debug shows "[REDACTED]"
//! }
//!
//! let creds = ProviderCredentials {
//!     grant_id: "grant-123".to_string(),
//!     api_key: SecretString::from("nyk_v0_secret"),
//! };
//!
//! // Safe - api_key is redacted
//! println!("{:?}", creds);
//!
//! // Explicit access only
//! let key: &str = creds.api_key.expose_secret();
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};
