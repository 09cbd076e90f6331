//! Common utilities shared across Match Controller components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;
