use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::{Message, NameIdPair};
use crate::transport::codec::WireMessage;

/// Text carried by `Info` responses.
pub mod info {
    pub const ADDED: &str = "added";
    pub const REMOVED: &str = "removed";
    pub const NOT_FOUND: &str = "not found";
    pub const PUBLISHED: &str = "published";
    pub const TOPIC_DOES_NOT_EXIST: &str = "topic does not exist";
    pub const UNKNOWN_REQUEST: &str = "unknown request";
}

/// A broker-to-client frame: either the direct answer to a request or a
/// pushed message from a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// First frame on every connection; carries the id the broker assigned.
    #[serde(rename = "welcome")]
    Welcome { client_id: Uuid },

    #[serde(rename = "info")]
    Info { text: String },

    #[serde(rename = "topic_created")]
    TopicCreated { topic_info: NameIdPair },

    #[serde(rename = "list_topics_result")]
    ListTopicsResult { topics: Vec<NameIdPair> },

    #[serde(rename = "new_message")]
    NewMessage { message: Message },
}

impl Response {
    pub fn info(text: impl Into<String>) -> Self {
        Response::Info { text: text.into() }
    }

    /// Whether this frame answers a request, as opposed to an unsolicited push.
    pub fn is_direct(&self) -> bool {
        matches!(
            self,
            Response::Info { .. } | Response::TopicCreated { .. } | Response::ListTopicsResult { .. }
        )
    }
}

impl WireMessage for Response {
    const TAGS: &'static [&'static str] = &[
        "welcome",
        "info",
        "topic_created",
        "list_topics_result",
        "new_message",
    ];
}
