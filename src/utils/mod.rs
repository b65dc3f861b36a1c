//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `relaybus` application.
//!
//! It centralizes the crate error type and logging setup so every component
//! reports failures and events the same way.

pub mod error;
pub mod logging;

pub use error::{BrokerError, Result};
