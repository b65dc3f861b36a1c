//! Connection handler
//!
//! Drives one connection from `Connecting` through `Active` to `Closed`.
//! While active, two futures run side by side on the connection's task:
//!
//! - the reader blocks on the channel until a whole frame has arrived,
//!   decodes it and hands it to the role;
//! - the writer sends whatever the role has ready, one frame at a time, and
//!   otherwise sleeps until the role signals new outbound work.
//!
//! Neither waits on the other, and there is no polling interval. The first
//! failure on either side ends the connection: the channel is closed, the
//! role is told, and the error is logged and returned, never propagated to
//! other connections.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::role::Role;
use crate::transport::channel::{ChannelReader, ChannelWriter, DuplexChannel};
use crate::transport::codec;
use crate::utils::BrokerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closed,
}

pub struct ConnectionHandler<R: Role> {
    role: Arc<R>,
    max_frame_bytes: usize,
    state: ConnectionState,
}

impl<R: Role> ConnectionHandler<R> {
    pub fn new(role: Arc<R>, max_frame_bytes: usize) -> Self {
        Self {
            role,
            max_frame_bytes,
            state: ConnectionState::Connecting,
        }
    }

    /// The broker-assigned id, once the role knows it.
    pub fn client_id(&self) -> Option<Uuid> {
        self.role.client_id()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run the connection until it closes.
    ///
    /// Returns the error that ended it; a peer hanging up shows up as
    /// `ConnectionClosed`.
    pub async fn run<S>(&mut self, stream: S) -> BrokerError
    where
        S: AsyncRead + AsyncWrite + Send,
    {
        let (mut reader, mut writer) = DuplexChannel::new(stream).split();

        self.role.on_connected();
        self.transition(ConnectionState::Active);

        let reason = tokio::select! {
            err = read_loop(self.role.as_ref(), &mut reader, self.max_frame_bytes) => err,
            err = write_loop(self.role.as_ref(), &mut writer) => err,
        };
        writer.close().await;

        self.transition(ConnectionState::Closed);
        self.role.on_disconnected();
        self.report(&reason);
        reason
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!(
            "{} connection {}: {:?} -> {:?}",
            self.role.name(),
            self.label(),
            self.state,
            next
        );
        self.state = next;
    }

    fn label(&self) -> String {
        match self.role.client_id() {
            Some(id) => id.to_string(),
            None => "(unassigned)".to_string(),
        }
    }

    fn report(&self, reason: &BrokerError) {
        match reason {
            BrokerError::ConnectionClosed => {
                info!("{} connection {} closed", self.role.name(), self.label())
            }
            err if err.is_protocol_violation() => warn!(
                "{} connection {} dropped after protocol violation: {err}",
                self.role.name(),
                self.label()
            ),
            err => warn!(
                "{} connection {} lost: {err}",
                self.role.name(),
                self.label()
            ),
        }
    }
}

async fn read_loop<R, S>(
    role: &R,
    reader: &mut ChannelReader<S>,
    max_frame_bytes: usize,
) -> BrokerError
where
    R: Role,
    S: AsyncRead + Unpin,
{
    loop {
        match codec::read_message::<R::Inbound, _>(reader, max_frame_bytes).await {
            Ok(message) => role.on_received(message),
            Err(BrokerError::UnknownType(tag)) => role.on_unknown(&tag),
            Err(err) => return err,
        }
    }
}

async fn write_loop<R, S>(role: &R, writer: &mut ChannelWriter<S>) -> BrokerError
where
    R: Role,
    S: AsyncWrite + Unpin,
{
    loop {
        match role.next_outbound() {
            Some(item) => {
                if let Err(err) = codec::write_message(writer, &item).await {
                    return err;
                }
            }
            None => role.outbound_ready().notified().await,
        }
    }
}
