//! Broker side of one client connection.
//!
//! Reads requests, runs them through the engine and queues the direct
//! response on the client's own outbound queue. The queue is also where
//! fan-out from other connections lands, so the connection's writer sends
//! both kinds of traffic in the order they were queued.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::broker::engine::Broker;
use crate::broker::outbound::ClientQueue;
use crate::connection::Role;
use crate::protocol::response::info;
use crate::protocol::{Request, Response};

pub struct BrokerSession {
    client_id: Uuid,
    broker: Arc<Broker>,
    queue: Arc<ClientQueue>,
}

impl BrokerSession {
    /// Register `client_id` with the broker and queue its welcome frame.
    pub fn new(client_id: Uuid, broker: Arc<Broker>) -> Self {
        let queue = broker.connect(client_id);
        Self {
            client_id,
            broker,
            queue,
        }
    }
}

impl Role for BrokerSession {
    type Inbound = Request;
    type Outbound = Response;

    fn name(&self) -> &str {
        "broker"
    }

    fn client_id(&self) -> Option<Uuid> {
        Some(self.client_id)
    }

    fn on_received(&self, request: Request) {
        debug!("{} sent {}", self.client_id, request.kind());
        let response = self.broker.handle(request, self.client_id);
        self.queue.push(response);
    }

    fn on_unknown(&self, tag: &str) {
        warn!("{} sent unknown request type {tag:?}", self.client_id);
        self.queue.push(Response::info(info::UNKNOWN_REQUEST));
    }

    fn next_outbound(&self) -> Option<Response> {
        self.queue.pop()
    }

    fn outbound_ready(&self) -> &Notify {
        self.queue.ready()
    }

    fn on_disconnected(&self) {
        self.broker.disconnect(&self.client_id);
    }
}
