//! Client representation
//!
//! `Client` is a connected publisher or subscriber. Connecting waits for the
//! broker's welcome frame, which carries the id this client is known by; the
//! client's identity is that id paired with its configured name.
//!
//! Every request method waits for the matching direct response. Messages
//! from subscribed topics arrive on the receiver returned by `connect`.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::client::session::{ClientRole, ClientSession};
use crate::connection::ConnectionHandler;
use crate::protocol::response::info;
use crate::protocol::{Message, NameIdPair, Request, Response};
use crate::utils::{BrokerError, Result};

pub struct Client {
    identity: NameIdPair,
    session: Arc<ClientSession>,
    task: JoinHandle<BrokerError>,
}

impl Client {
    /// Connect to the broker at `addr` over TCP.
    pub async fn connect(
        addr: &str,
        name: &str,
        role: ClientRole,
        max_frame_bytes: usize,
    ) -> Result<(Self, UnboundedReceiver<Message>)> {
        let stream = TcpStream::connect(addr).await?;
        let _ = stream.set_nodelay(true);
        info!("{role} {name} connected to {addr}");
        Self::connect_with(stream, name, role, max_frame_bytes).await
    }

    /// Run the client protocol over an already connected stream.
    pub async fn connect_with<S>(
        stream: S,
        name: &str,
        role: ClientRole,
        max_frame_bytes: usize,
    ) -> Result<(Self, UnboundedReceiver<Message>)>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (session, welcome, deliveries) = ClientSession::new(role);
        let session = Arc::new(session);

        // the handler learns the broker-assigned id from the welcome frame
        let mut handler = ConnectionHandler::new(session.clone(), max_frame_bytes);
        let task = tokio::spawn(async move { handler.run(stream).await });

        let client_id = match welcome.await {
            Ok(id) => id,
            Err(_) => {
                task.abort();
                return Err(BrokerError::ConnectionClosed);
            }
        };
        let client = Self {
            identity: NameIdPair::new(name, client_id),
            session,
            task,
        };
        Ok((client, deliveries))
    }

    pub fn identity(&self) -> &NameIdPair {
        &self.identity
    }

    pub fn role(&self) -> ClientRole {
        self.session.role()
    }

    pub fn is_connected(&self) -> bool {
        !self.task.is_finished()
    }

    /// Send any request and wait for its direct response.
    pub async fn request(&self, request: Request) -> Result<Response> {
        self.session.request(request).await
    }

    pub async fn create_topic(&self, name: &str) -> Result<NameIdPair> {
        let request = Request::CreateTopic {
            name: name.to_string(),
        };
        match self.request(request).await? {
            Response::TopicCreated { topic_info } => Ok(topic_info),
            other => Err(unexpected("topic_created", &other)),
        }
    }

    /// List the broker's topics and refresh the local topic cache.
    pub async fn list_topics(&self) -> Result<Vec<NameIdPair>> {
        match self.request(Request::ListTopics {}).await? {
            Response::ListTopicsResult { topics } => Ok(topics),
            other => Err(unexpected("list_topics_result", &other)),
        }
    }

    /// Returns false if the topic does not exist.
    pub async fn subscribe(&self, topic_id: Uuid) -> Result<bool> {
        let request = Request::Subscribe {
            subscriber: self.identity.clone(),
            topic_id,
        };
        self.expect_info(request, info::ADDED).await
    }

    /// Returns false if the topic does not exist or this client was not
    /// subscribed to it.
    pub async fn unsubscribe(&self, topic_id: Uuid) -> Result<bool> {
        let request = Request::Unsubscribe {
            subscriber: self.identity.clone(),
            topic_id,
        };
        self.expect_info(request, info::REMOVED).await
    }

    /// Publish `content` to `topic`. Returns false if the topic does not exist.
    pub async fn publish(&self, topic: &NameIdPair, content: &str) -> Result<bool> {
        let message = Message::new(self.identity.clone(), topic.clone(), content);
        self.expect_info(Request::Publish { message }, info::PUBLISHED)
            .await
    }

    /// Id of the first topic called `name` in the last listing.
    pub fn find_topic_id(&self, name: &str) -> Option<Uuid> {
        self.session.find_topic_id(name)
    }

    pub fn topic_cache(&self) -> Vec<NameIdPair> {
        self.session.topic_cache()
    }

    /// Close the connection. Queued requests fail with `ConnectionClosed`.
    pub fn disconnect(self) {
        drop(self);
    }

    async fn expect_info(&self, request: Request, success: &str) -> Result<bool> {
        match self.request(request).await? {
            Response::Info { text } => Ok(text == success),
            other => Err(unexpected("info", &other)),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.session.close();
        self.task.abort();
    }
}

fn unexpected(wanted: &str, got: &Response) -> BrokerError {
    BrokerError::UnexpectedResponse(format!("expected {wanted}, got {got:?}"))
}
