//! The `protocol` module defines the data exchanged between clients and the
//! broker: identities, published messages, and the request/response taxonomy.
//!
//! Requests and responses are closed enums tagged by a `type` field on the
//! wire, so every dispatch site matches them exhaustively.

pub mod identity;
pub mod message;
pub mod request;
pub mod response;

pub use identity::NameIdPair;
pub use message::Message;
pub use request::Request;
pub use response::Response;
