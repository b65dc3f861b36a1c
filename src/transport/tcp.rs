//! TCP transport
//!
//! Accepts connections, assigns each one a fresh client id and runs a
//! broker-side [`ConnectionHandler`] for it on its own task. A failing
//! connection only ends its own task, and a failing `accept` never ends the
//! server.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::broker::{Broker, BrokerSession};
use crate::config::Settings;
use crate::connection::ConnectionHandler;
use crate::utils::Result;

/// Pause after an accept error that is not tied to a single connection,
/// e.g. running out of file descriptors.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of incoming connections for [`serve_with`].
pub trait Acceptor: Send + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + 'static;

    fn accept(&mut self) -> impl Future<Output = io::Result<(Self::Stream, SocketAddr)>> + Send;
}

impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = TcpListener::accept(self).await?;
        let _ = stream.set_nodelay(true);
        Ok((stream, peer))
    }
}

/// Bind to the configured address and serve. Only fails if binding does.
pub async fn start_tcp_server(broker: Arc<Broker>, settings: &Settings) -> Result<()> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Broker listening on tcp://{}", listener.local_addr()?);
    serve(listener, broker, settings.broker.max_frame_bytes).await;
    Ok(())
}

/// Accept connections from an already bound listener, forever.
pub async fn serve(listener: TcpListener, broker: Arc<Broker>, max_frame_bytes: usize) {
    serve_with(listener, broker, max_frame_bytes).await
}

pub async fn serve_with<A: Acceptor>(mut acceptor: A, broker: Arc<Broker>, max_frame_bytes: usize) {
    loop {
        let (stream, peer) = match acceptor.accept().await {
            Ok(accepted) => accepted,
            Err(e) if is_connection_error(&e) => {
                warn!("Dropped connection during accept: {e}");
                continue;
            }
            Err(e) => {
                error!("Failed to accept connection: {e}");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let client_id = Uuid::new_v4();
        info!("Accepted {peer} as client {client_id}");
        tokio::spawn(handle_client(
            stream,
            peer,
            client_id,
            broker.clone(),
            max_frame_bytes,
        ));
    }
}

/// Errors that concern only the connection being accepted; the listener is
/// fine and the next accept can go ahead straight away.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}

async fn handle_client<S>(
    stream: S,
    peer: SocketAddr,
    client_id: Uuid,
    broker: Arc<Broker>,
    max_frame_bytes: usize,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let session = Arc::new(BrokerSession::new(client_id, broker));
    let mut handler = ConnectionHandler::new(session, max_frame_bytes);
    let reason = handler.run(stream).await;
    debug!("{peer} ({client_id}) handler finished: {reason}");
}
