//! Broker engine
//!
//! This module contains the protocol engine responsible for:
//! - interpreting each inbound request against the topic registry
//! - fanning published messages out to the subscribers' outbound queues
//! - producing exactly one direct response per request
//!
//! Concurrency and usage notes:
//! - `Broker` is shared behind an `Arc` by every connection task. It holds no
//!   lock of its own; the registry and the queue manager synchronize
//!   internally, one map entry at a time.
//! - A publish reads the subscriber set and then enqueues to each member.
//!   Those two steps are not atomic with respect to concurrent subscribes
//!   and unsubscribes.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::broker::outbound::{ClientQueue, OutboundQueues};
use crate::broker::registry::TopicRegistry;
use crate::protocol::response::info;
use crate::protocol::{Message, Request, Response};

#[derive(Debug, Default)]
pub struct Broker {
    pub registry: TopicRegistry,
    pub queues: OutboundQueues,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted client and queue its welcome frame.
    pub fn connect(&self, client_id: Uuid) -> Arc<ClientQueue> {
        let queue = self.queues.register(client_id);
        queue.push(Response::Welcome { client_id });
        info!("Client {client_id} connected");
        queue
    }

    /// Forget a client: detach it from every topic and drop whatever was
    /// still queued for it.
    pub fn disconnect(&self, client_id: &Uuid) {
        let topics = self.registry.remove_subscriber(client_id);
        let dropped = self.queues.discard(client_id);
        info!(
            "Cleaned up client {client_id} (left {topics} topics, dropped {dropped} queued responses)"
        );
    }

    /// Interpret one request from `requester` and return the direct response.
    ///
    /// The caller delivers the returned response to the requester; fan-out to
    /// subscribers happens here.
    pub fn handle(&self, request: Request, requester: Uuid) -> Response {
        match request {
            Request::CreateTopic { name } => {
                let topic_info = self.registry.create_topic(&name);
                info!("{requester} created topic {topic_info}");
                Response::TopicCreated { topic_info }
            }
            Request::ListTopics {} => Response::ListTopicsResult {
                topics: self.registry.list_topics(),
            },
            Request::Subscribe {
                subscriber,
                topic_id,
            } => {
                let label = subscriber.to_string();
                if self.registry.subscribe(&topic_id, subscriber) {
                    info!("{label} subscribed to {topic_id}");
                    Response::info(info::ADDED)
                } else {
                    Response::info(info::TOPIC_DOES_NOT_EXIST)
                }
            }
            Request::Unsubscribe {
                subscriber,
                topic_id,
            } => {
                if self.registry.unsubscribe(&topic_id, &subscriber.id) {
                    info!("{subscriber} unsubscribed from {topic_id}");
                    Response::info(info::REMOVED)
                } else {
                    Response::info(info::NOT_FOUND)
                }
            }
            Request::Publish { message } => {
                if self.publish(message) {
                    Response::info(info::PUBLISHED)
                } else {
                    Response::info(info::TOPIC_DOES_NOT_EXIST)
                }
            }
        }
    }

    /// Queue `NewMessage` for every connected subscriber of the message's
    /// topic. Returns false, and queues nothing, if the topic does not exist.
    pub fn publish(&self, message: Message) -> bool {
        let topic_id = message.topic.id;
        if self.registry.topic_info(&topic_id).is_none() {
            debug!("Publish to unknown topic {topic_id} ignored");
            return false;
        }

        // subscribers whose connection is already gone are skipped
        let mut delivered = 0;
        for subscriber in self.registry.subscribers_of(&topic_id) {
            let push = Response::NewMessage {
                message: message.clone(),
            };
            if self.queues.deliver(&subscriber, push) {
                delivered += 1;
            }
        }
        debug!(
            "{} published to {} ({delivered} recipients)",
            message.publisher, message.topic
        );
        true
    }
}
