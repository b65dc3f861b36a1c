//! Topic management
//!
//! A `Topic` holds its identity and the set of subscribers attached to it,
//! keyed by subscriber id so that subscribing twice is a no-op.
//!
//! Concurrency note: callers must synchronize access to `Topic`; the
//! registry does so by keeping each topic inside a `DashMap` entry.

use std::collections::HashMap;

use uuid::Uuid;

use crate::protocol::NameIdPair;

pub type SubscriberId = Uuid;

#[derive(Debug)]
pub struct Topic {
    pub info: NameIdPair,
    pub subscribers: HashMap<SubscriberId, NameIdPair>,
    /// Creation order within the registry.
    pub(crate) seq: u64,
}

impl Topic {
    /// Create a new topic with no subscribers.
    pub fn new(info: NameIdPair, seq: u64) -> Self {
        Self {
            info,
            subscribers: HashMap::new(),
            seq,
        }
    }

    /// Add a subscriber to the topic. Duplicate adds are ignored.
    pub fn subscribe(&mut self, subscriber: NameIdPair) {
        self.subscribers.entry(subscriber.id).or_insert(subscriber);
    }

    /// Remove a subscriber. Returns whether it was present.
    pub fn unsubscribe(&mut self, id: &SubscriberId) -> bool {
        self.subscribers.remove(id).is_some()
    }
}
