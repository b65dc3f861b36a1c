use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::{Message, NameIdPair};
use crate::transport::codec::WireMessage;

/// A client-to-broker request. Exactly one is carried per frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "create_topic")]
    CreateTopic { name: String },

    #[serde(rename = "list_topics")]
    ListTopics {},

    #[serde(rename = "subscribe")]
    Subscribe {
        subscriber: NameIdPair,
        topic_id: Uuid,
    },

    #[serde(rename = "unsubscribe")]
    Unsubscribe {
        subscriber: NameIdPair,
        topic_id: Uuid,
    },

    #[serde(rename = "publish")]
    Publish { message: Message },
}

impl Request {
    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::CreateTopic { .. } => "create_topic",
            Request::ListTopics {} => "list_topics",
            Request::Subscribe { .. } => "subscribe",
            Request::Unsubscribe { .. } => "unsubscribe",
            Request::Publish { .. } => "publish",
        }
    }
}

impl WireMessage for Request {
    const TAGS: &'static [&'static str] = &[
        "create_topic",
        "list_topics",
        "subscribe",
        "unsubscribe",
        "publish",
    ];
}
