//! Message definitions for the broker
//!
//! `Message` is what a publisher sends and what every subscriber of the
//! topic receives. It is built by the publisher at send time and never
//! modified afterwards; the broker only clones it while fanning out.
//!
//! Notes on fields:
//! - `publisher`: identity of the sending client
//! - `topic`: name and broker-assigned id of the destination topic
//! - `timestamp`: UTC instant the publisher created the message
//! - `content`: opaque payload, passed through untouched

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::NameIdPair;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub publisher: NameIdPair,
    pub topic: NameIdPair,
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

impl Message {
    /// Build a message stamped with the current time.
    pub fn new(publisher: NameIdPair, topic: NameIdPair, content: impl Into<String>) -> Self {
        Self {
            publisher,
            topic,
            timestamp: Utc::now(),
            content: content.into(),
        }
    }
}
