//! # RelayBus
//!
//! `relaybus` is a minimal, in-memory publish/subscribe broker built with Rust.
//! Clients create named topics, publish messages to them, and subscribe to
//! receive what others publish. Everything travels as length-prefixed JSON
//! frames over TCP.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `protocol`: Identities, messages, and the request/response taxonomy.
//! - `transport`: The wire codec, the duplex channel it runs over, and the TCP acceptor.
//! - `connection`: The per-connection handler, generic over a role strategy.
//! - `broker`: The topic registry, per-client outbound queues, and the protocol engine.
//! - `client`: Publisher and subscriber sessions with a typed request API.
//! - `config`: Handles loading and managing configuration.
//! - `utils`: Shared utilities, such as error handling and logging.

pub mod broker;
pub mod client;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod transport;
pub mod utils;
