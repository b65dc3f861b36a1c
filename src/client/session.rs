//! Client side of a broker connection.
//!
//! Requests are queued locally and sent one at a time: the next request
//! goes out only after the direct response to the previous one has arrived.
//! Pushed `NewMessage` frames are not responses and bypass that flow control;
//! they are forwarded to the application channel as they arrive.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tokio::sync::{Notify, mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::connection::Role;
use crate::protocol::{Message, NameIdPair, Request, Response};
use crate::utils::{BrokerError, Result};

/// Which kind of client this session acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRole {
    Publisher,
    Subscriber,
}

impl ClientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientRole::Publisher => "publisher",
            ClientRole::Subscriber => "subscriber",
        }
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Reply = oneshot::Sender<Response>;

#[derive(Default)]
struct Outgoing {
    queue: VecDeque<(Request, Reply)>,
    in_flight: Option<Reply>,
    closed: bool,
}

pub struct ClientSession {
    role: ClientRole,
    outgoing: Mutex<Outgoing>,
    ready: Notify,
    welcome: Mutex<Option<oneshot::Sender<Uuid>>>,
    client_id: Mutex<Option<Uuid>>,
    deliveries: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    topic_cache: Mutex<Vec<NameIdPair>>,
}

impl ClientSession {
    /// Returns the session, a receiver resolved with the broker-assigned
    /// client id, and the channel delivered messages arrive on.
    pub fn new(
        role: ClientRole,
    ) -> (
        Self,
        oneshot::Receiver<Uuid>,
        mpsc::UnboundedReceiver<Message>,
    ) {
        let (welcome_tx, welcome_rx) = oneshot::channel();
        let (deliveries_tx, deliveries_rx) = mpsc::unbounded_channel();
        let session = Self {
            role,
            outgoing: Mutex::new(Outgoing::default()),
            ready: Notify::new(),
            welcome: Mutex::new(Some(welcome_tx)),
            client_id: Mutex::new(None),
            deliveries: Mutex::new(Some(deliveries_tx)),
            topic_cache: Mutex::new(Vec::new()),
        };
        (session, welcome_rx, deliveries_rx)
    }

    pub fn role(&self) -> ClientRole {
        self.role
    }

    /// Queue a request. The receiver resolves with its direct response, or
    /// errors if the connection closes first.
    pub fn submit(&self, request: Request) -> Result<oneshot::Receiver<Response>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut outgoing = self.lock_outgoing();
            if outgoing.closed {
                return Err(BrokerError::ConnectionClosed);
            }
            outgoing.queue.push_back((request, tx));
        }
        self.ready.notify_one();
        Ok(rx)
    }

    /// Queue a request and wait for its direct response.
    pub async fn request(&self, request: Request) -> Result<Response> {
        self.submit(request)?
            .await
            .map_err(|_| BrokerError::ConnectionClosed)
    }

    /// Whether a request has been sent and its response not yet received.
    pub fn is_waiting(&self) -> bool {
        self.lock_outgoing().in_flight.is_some()
    }

    /// Requests queued but not yet sent.
    pub fn queued(&self) -> usize {
        self.lock_outgoing().queue.len()
    }

    /// Topics from the most recent topic listing.
    pub fn topic_cache(&self) -> Vec<NameIdPair> {
        self.topic_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Id of the first cached topic called `name`.
    pub fn find_topic_id(&self, name: &str) -> Option<Uuid> {
        self.topic_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|topic| topic.name == name)
            .map(|topic| topic.id)
    }

    /// Fail every queued and outstanding request and refuse new ones. The
    /// delivery channel is closed too, so its receiver sees the end.
    pub fn close(&self) {
        let mut outgoing = self.lock_outgoing();
        outgoing.closed = true;
        outgoing.queue.clear();
        outgoing.in_flight = None;
        drop(outgoing);

        self.welcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn lock_outgoing(&self) -> std::sync::MutexGuard<'_, Outgoing> {
        self.outgoing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, response: Response) {
        let reply = self.lock_outgoing().in_flight.take();
        match reply {
            Some(reply) => {
                // the caller may have stopped waiting; that is fine
                let _ = reply.send(response);
                self.ready.notify_one();
            }
            None => warn!("{}: dropping unsolicited response {response:?}", self.role),
        }
    }
}

impl Role for ClientSession {
    type Inbound = Response;
    type Outbound = Request;

    fn name(&self) -> &str {
        self.role.as_str()
    }

    fn client_id(&self) -> Option<Uuid> {
        *self.client_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_received(&self, response: Response) {
        match response {
            Response::Welcome { client_id } => {
                *self
                    .client_id
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(client_id);
                let welcome = self
                    .welcome
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                match welcome {
                    Some(tx) => {
                        let _ = tx.send(client_id);
                    }
                    None => warn!("{}: duplicate welcome for {client_id}", self.role),
                }
            }
            Response::NewMessage { message } => {
                debug!(
                    "{}: new message from {} in {}",
                    self.role, message.publisher, message.topic
                );
                let deliveries = self.deliveries.lock().unwrap_or_else(PoisonError::into_inner);
                let sent = deliveries
                    .as_ref()
                    .is_some_and(|tx| tx.send(message).is_ok());
                if !sent {
                    debug!("{}: delivery channel closed, message dropped", self.role);
                }
            }
            Response::ListTopicsResult { topics } => {
                *self
                    .topic_cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = topics.clone();
                self.complete(Response::ListTopicsResult { topics });
            }
            direct => self.complete(direct),
        }
    }

    fn next_outbound(&self) -> Option<Request> {
        let mut outgoing = self.lock_outgoing();
        if outgoing.closed || outgoing.in_flight.is_some() {
            return None;
        }
        let (request, reply) = outgoing.queue.pop_front()?;
        outgoing.in_flight = Some(reply);
        Some(request)
    }

    fn outbound_ready(&self) -> &Notify {
        &self.ready
    }

    fn on_disconnected(&self) {
        self.close();
    }
}
