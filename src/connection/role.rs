use tokio::sync::Notify;
use uuid::Uuid;

use crate::transport::codec::WireMessage;

/// Per-role behavior plugged into a [`ConnectionHandler`](super::ConnectionHandler).
///
/// One value is created per connection and shared between the handler's
/// reader and writer, so hooks take `&self` and use interior mutability.
pub trait Role: Send + Sync + 'static {
    /// What this side reads off the wire.
    type Inbound: WireMessage;
    /// What this side writes to the wire.
    type Outbound: WireMessage;

    /// Label used in log lines.
    fn name(&self) -> &str;

    /// Id the broker knows this connection by, if already assigned.
    fn client_id(&self) -> Option<Uuid>;

    /// Called once before the first frame is read or written.
    fn on_connected(&self) {}

    /// Called for every decoded inbound frame, in arrival order.
    fn on_received(&self, message: Self::Inbound);

    /// Called when a well-framed message carries an unrecognized type tag.
    fn on_unknown(&self, tag: &str) {
        tracing::warn!("{}: ignoring message with unknown type {tag:?}", self.name());
    }

    /// Next item to send, if one is ready. Must not block.
    fn next_outbound(&self) -> Option<Self::Outbound>;

    /// Notified whenever `next_outbound` may have become non-empty.
    fn outbound_ready(&self) -> &Notify;

    /// Called once after the connection has closed, whatever the cause.
    fn on_disconnected(&self) {}
}
