//! The `transport` module is responsible for moving typed messages over a
//! byte stream.
//!
//! It defines the length-prefixed wire codec, the duplex channel wrapper the
//! codec reads from and writes to, and the TCP acceptor that hands each new
//! connection to the broker.

pub mod channel;
pub mod codec;
pub mod tcp;

pub use channel::DuplexChannel;
pub use codec::{WireMessage, decode, encode};
pub use tcp::{Acceptor, serve, serve_with, start_tcp_server};
