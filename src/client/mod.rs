//! The `client` module implements the publisher and subscriber side of the
//! protocol.
//!
//! [`ClientSession`] is the connection role that paces requests and routes
//! pushed messages; [`Client`] wraps it in a typed request API.

pub mod pubsub_client;
pub mod session;

pub use pubsub_client::Client;
pub use session::{ClientRole, ClientSession};
