//! Structured control-message records
//!
//! The RFC5444 codec parses route requests and route replies into
//! [`PacketData`] before handing them to the routing core, and encodes the
//! records the core produces. The core never sees wire bytes.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::address::NodeAddress;
use crate::metric::MetricType;
use crate::seqnum::SeqNum;

/// Per-node fields of a control message (OrigNode or TargNode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// The node's address
    pub addr: NodeAddress,
    /// Metric from the message's originator to this node
    pub metric: u8,
    /// The node's sequence number as carried in the message
    pub seq_num: SeqNum,
}

impl NodeData {
    /// Create node data
    pub fn new(addr: NodeAddress, metric: u8, seq_num: SeqNum) -> Self {
        Self {
            addr,
            metric,
            seq_num,
        }
    }
}

/// A route request or route reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketData {
    /// Remaining hops this message may travel
    pub hop_limit: u8,
    /// Neighbor the message was received from (own address when originating)
    pub sender: NodeAddress,
    /// Metric type all metrics in this message are expressed in
    pub metric_type: MetricType,
    /// The node that originated the route discovery
    pub orig_node: NodeData,
    /// The node a route is being sought for
    pub targ_node: NodeData,
    /// When the message was received or created
    pub timestamp: Instant,
}

impl PacketData {
    /// Origin/target pair identifying a route discovery
    pub fn discovery_key(&self) -> (NodeAddress, NodeAddress) {
        (self.orig_node.addr, self.targ_node.addr)
    }
}

/// An entry in a route error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreachableNode {
    /// Address that can no longer be reached
    pub addr: NodeAddress,
    /// Last sequence number known for it
    pub seq_num: SeqNum,
}

impl UnreachableNode {
    /// Create an unreachable node entry
    pub fn new(addr: NodeAddress, seq_num: SeqNum) -> Self {
        Self { addr, seq_num }
    }
}

/// A message handed to the codec for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Route request to flood or forward
    RouteRequest {
        packet: PacketData,
        destination: NodeAddress,
    },

    /// Route reply to unicast toward the request's origin
    RouteReply {
        packet: PacketData,
        destination: NodeAddress,
    },

    /// Route error announcing unreachable destinations
    RouteError {
        unreachable: Vec<UnreachableNode>,
        hop_limit: u8,
        destination: NodeAddress,
    },
}

impl OutboundMessage {
    /// Address the message is sent to
    pub fn destination(&self) -> NodeAddress {
        match self {
            Self::RouteRequest { destination, .. }
            | Self::RouteReply { destination, .. }
            | Self::RouteError { destination, .. } => *destination,
        }
    }

    /// RFC5444 message type
    pub fn msg_type(&self) -> u8 {
        match self {
            Self::RouteRequest { .. } => crate::constants::msg_type::RREQ,
            Self::RouteReply { .. } => crate::constants::msg_type::RREP,
            Self::RouteError { .. } => crate::constants::msg_type::RERR,
        }
    }

    /// Check if this is a route request
    pub fn is_route_request(&self) -> bool {
        matches!(self, Self::RouteRequest { .. })
    }

    /// Check if this is a route reply
    pub fn is_route_reply(&self) -> bool {
        matches!(self, Self::RouteReply { .. })
    }

    /// Check if this is a route error
    pub fn is_route_error(&self) -> bool {
        matches!(self, Self::RouteError { .. })
    }
}
