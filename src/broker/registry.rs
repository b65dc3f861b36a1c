//! Topic registry
//!
//! Authoritative map from topic id to topic state. All operations are safe
//! to call concurrently from every connection task; each one locks only the
//! map shard holding the topic it touches, never the whole registry.
//!
//! There is no lock spanning more than one call. A publish that reads
//! `subscribers_of` and then enqueues may race with a concurrent subscribe or
//! unsubscribe; such a subscriber may or may not see that message.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use uuid::Uuid;

use crate::broker::topic::{SubscriberId, Topic};
use crate::protocol::NameIdPair;

#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: DashMap<Uuid, Topic>,
    next_seq: AtomicU64,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a topic with a fresh id. Names need not be unique.
    pub fn create_topic(&self, name: &str) -> NameIdPair {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        loop {
            let info = NameIdPair::generate(name);
            // v4 collisions are practically impossible, but ids must never repeat
            if let Entry::Vacant(slot) = self.topics.entry(info.id) {
                slot.insert(Topic::new(info.clone(), seq));
                debug!("Created topic {info}");
                return info;
            }
        }
    }

    /// Name and id of every topic, in creation order. Subscriber sets are
    /// never included.
    pub fn list_topics(&self) -> Vec<NameIdPair> {
        let mut topics: Vec<(u64, NameIdPair)> = self
            .topics
            .iter()
            .map(|entry| (entry.seq, entry.info.clone()))
            .collect();
        topics.sort_by_key(|(seq, _)| *seq);
        topics.into_iter().map(|(_, info)| info).collect()
    }

    /// Look up a topic's identity.
    pub fn topic_info(&self, topic_id: &Uuid) -> Option<NameIdPair> {
        self.topics.get(topic_id).map(|topic| topic.info.clone())
    }

    /// Returns false when the topic does not exist.
    pub fn subscribe(&self, topic_id: &Uuid, subscriber: NameIdPair) -> bool {
        match self.topics.get_mut(topic_id) {
            Some(mut topic) => {
                topic.subscribe(subscriber);
                true
            }
            None => false,
        }
    }

    /// Returns false when the topic does not exist or the subscriber was not
    /// attached to it.
    pub fn unsubscribe(&self, topic_id: &Uuid, subscriber_id: &SubscriberId) -> bool {
        self.topics
            .get_mut(topic_id)
            .is_some_and(|mut topic| topic.unsubscribe(subscriber_id))
    }

    /// Ids of the topic's current subscribers; empty for unknown topics.
    pub fn subscribers_of(&self, topic_id: &Uuid) -> HashSet<SubscriberId> {
        self.topics
            .get(topic_id)
            .map(|topic| topic.subscribers.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Detach a subscriber from every topic. Returns how many topics it left.
    pub fn remove_subscriber(&self, subscriber_id: &SubscriberId) -> usize {
        let mut removed = 0;
        for mut topic in self.topics.iter_mut() {
            if topic.unsubscribe(subscriber_id) {
                debug!("Unsubscribed {subscriber_id} from topic {}", topic.info);
                removed += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
