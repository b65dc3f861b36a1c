//! The `error` module defines the error taxonomy used within the `relaybus`
//! application.
//!
//! Every failure is local to one connection: `ConnectionClosed` and the
//! protocol violations (`MalformedFrame`, `UnknownType`) tear down that
//! connection only. Lookups of unknown topics are never errors; they are
//! answered with an `Info` response instead.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// The peer went away or the channel was closed locally.
    #[error("connection closed")]
    ConnectionClosed,

    /// The frame could not be read or its payload could not be parsed.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The payload parsed, but its type tag is not one we recognize.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The broker answered a request with a response of the wrong kind.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<io::Error> for BrokerError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => BrokerError::ConnectionClosed,
            _ => BrokerError::Io(err),
        }
    }
}

impl BrokerError {
    /// True for errors caused by the peer violating the wire protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            BrokerError::MalformedFrame(_) | BrokerError::UnknownType(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;
