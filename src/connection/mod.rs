//! The `connection` module owns one connection's lifecycle.
//!
//! A [`ConnectionHandler`] is generic over a [`Role`]: the broker side reads
//! requests and writes responses, a client reads responses and writes
//! requests. The handler itself only moves frames and reports when the
//! connection is lost.

pub mod handler;
pub mod role;

pub use handler::{ConnectionHandler, ConnectionState};
pub use role::Role;
