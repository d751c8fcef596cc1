//! # AODVv2 Core
//!
//! Core types, traits, and errors for the AODVv2 routing core.
//!
//! This crate holds everything the routing tables and the inbound/outbound
//! message handling agree on, without any table logic of its own.
//!
//! ## Key Types
//!
//! - [`NodeAddress`]: IPv6 address of a mesh node
//! - [`MetricType`]: Identifier of a route cost function
//! - [`SeqNum`] / [`SequenceNumber`]: Sequence numbers with wraparound-aware ordering
//! - [`PacketData`]: Parsed route request / route reply record
//! - [`UnreachableNode`]: Entry of a route error
//!
//! ## Key Traits
//!
//! - [`PacketWriter`]: Outbound collaborator that encodes and sends control messages
//! - [`Clock`]: Time abstraction for testability

pub mod address;
pub mod clock;
pub mod constants;
pub mod error;
pub mod metric;
pub mod packet;
pub mod seqnum;
pub mod writer;

// Re-export main types
pub use address::NodeAddress;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use metric::{MAX_METRIC, MetricType, add_link_cost};
pub use packet::{NodeData, OutboundMessage, PacketData, UnreachableNode};
pub use seqnum::{SeqNum, SequenceNumber, is_fresher};
pub use writer::{ChannelWriter, PacketWriter};
