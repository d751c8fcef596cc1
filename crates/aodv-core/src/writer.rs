//! Outbound control-message collaborator
//!
//! The routing core emits route requests, replies and errors through a
//! [`PacketWriter`]. Implementations own RFC5444 encoding and the UDP
//! socket; the core only hands over typed records. Sends are
//! fire-and-forget: a writer must not block the caller and its own
//! failures are not reported back.

use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::address::NodeAddress;
use crate::packet::{OutboundMessage, PacketData, UnreachableNode};

/// Sink for control messages produced by the routing core
pub trait PacketWriter: Send + Sync {
    /// Send a route request (originated or forwarded)
    fn send_route_request(&self, packet: &PacketData, destination: NodeAddress);

    /// Send a route reply toward the request's origin
    fn send_route_reply(&self, packet: &PacketData, destination: NodeAddress);

    /// Send a route error listing unreachable destinations
    fn send_route_error(
        &self,
        unreachable: &[UnreachableNode],
        hop_limit: u8,
        destination: NodeAddress,
    );
}

/// Writer that queues messages on an unbounded channel
///
/// The receiving half is drained by whatever task owns the codec and
/// socket. Queueing never blocks, which keeps the forwarding path free of
/// I/O.
#[derive(Debug, Clone)]
pub struct ChannelWriter {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelWriter {
    /// Create a writer and the receiver for its messages
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn enqueue(&self, message: OutboundMessage) {
        trace!(
            msg_type = message.msg_type(),
            destination = %message.destination(),
            "Queueing control message"
        );
        if self.tx.send(message).is_err() {
            warn!("Outbound channel closed, dropping control message");
        }
    }
}

impl PacketWriter for ChannelWriter {
    fn send_route_request(&self, packet: &PacketData, destination: NodeAddress) {
        self.enqueue(OutboundMessage::RouteRequest {
            packet: packet.clone(),
            destination,
        });
    }

    fn send_route_reply(&self, packet: &PacketData, destination: NodeAddress) {
        self.enqueue(OutboundMessage::RouteReply {
            packet: packet.clone(),
            destination,
        });
    }

    fn send_route_error(
        &self,
        unreachable: &[UnreachableNode],
        hop_limit: u8,
        destination: NodeAddress,
    ) {
        self.enqueue(OutboundMessage::RouteError {
            unreachable: unreachable.to_vec(),
            hop_limit,
            destination,
        });
    }
}
