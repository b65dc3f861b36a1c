//! Outbound queue manager
//!
//! One FIFO of pending responses per client, keyed by the client's
//! connection id. Queues are created lazily on first use and discarded when
//! the connection closes, together with anything still waiting in them.
//!
//! Queues are unbounded: a client that stops reading accumulates memory
//! until it disconnects.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::protocol::Response;

/// A single client's pending responses plus the signal its writer waits on.
#[derive(Debug, Default)]
pub struct ClientQueue {
    items: Mutex<VecDeque<Response>>,
    ready: Notify,
}

impl ClientQueue {
    pub fn push(&self, response: Response) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        // notify_one keeps a permit if the writer is not waiting yet
        self.ready.notify_one();
    }

    pub fn pop(&self) -> Option<Response> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signalled every time a response is pushed.
    pub fn ready(&self) -> &Notify {
        &self.ready
    }
}

#[derive(Debug, Default)]
pub struct OutboundQueues {
    queues: DashMap<Uuid, Arc<ClientQueue>>,
}

impl OutboundQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the client's queue, creating it if needed.
    pub fn register(&self, client_id: Uuid) -> Arc<ClientQueue> {
        self.queues.entry(client_id).or_default().clone()
    }

    pub fn enqueue(&self, client_id: Uuid, response: Response) {
        self.register(client_id).push(response);
    }

    /// Push to an existing queue only. Returns false if the client has no
    /// queue, e.g. because it already disconnected.
    pub fn deliver(&self, client_id: &Uuid, response: Response) -> bool {
        let Some(queue) = self.queues.get(client_id).map(|q| q.clone()) else {
            return false;
        };
        queue.push(response);
        true
    }

    pub fn try_dequeue(&self, client_id: &Uuid) -> Option<Response> {
        let queue = self.queues.get(client_id)?.clone();
        queue.pop()
    }

    /// Drop the client's queue. Returns how many undelivered responses it held.
    pub fn discard(&self, client_id: &Uuid) -> usize {
        self.queues
            .remove(client_id)
            .map(|(_, queue)| queue.len())
            .unwrap_or(0)
    }

    pub fn pending(&self, client_id: &Uuid) -> usize {
        self.queues.get(client_id).map(|q| q.len()).unwrap_or(0)
    }

    pub fn contains(&self, client_id: &Uuid) -> bool {
        self.queues.contains_key(client_id)
    }

    /// Number of clients that currently have a queue.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
