//! # AODVv2 Routing
//!
//! Reactive route discovery for AODVv2 mesh nodes.
//!
//! This crate keeps the routing state of one node and implements the
//! protocol decisions around it. Encoding and sockets are not handled
//! here: control messages enter through the `on_*` handlers of
//! [`AodvNode`] and leave through a [`PacketWriter`](aodv_core::PacketWriter).
//!
//! ## Core Components
//!
//! - [`AodvNode`]: Per-node context tying the tables, sequence number and writer together
//! - [`RouteResolver`]: Answers next-hop queries, starting discovery on a miss
//! - [`RoutingTable`]: Best route per destination with lazy expiration
//! - [`RreqTable`]: Suppresses redundant copies of flooded route requests
//! - [`ClientTable`]: Addresses this node terminates traffic for
//!
//! ## Route Resolution
//!
//! The resolver uses a four-step decision process:
//!
//! 1. **LOCAL**: The destination is a client of this node
//! 2. **NEXT HOP**: A usable route exists
//! 3. **BROKEN**: The route is broken; a route error is sent and no route returned
//! 4. **DISCOVER**: No route; a route request is flooded and no route returned
//!
//! ## Route Aging
//!
//! Routes are active while used, idle after `ACTIVE_INTERVAL` without use,
//! and expired after a further `MAX_IDLETIME`. Expired routes are reclaimed
//! on access; [`RoutingTable::purge_expired`] sweeps them eagerly.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use aodv_core::ChannelWriter;
//! use aodv_routing::{AodvConfig, AodvNode, RouteDecision};
//!
//! let (writer, outbound) = ChannelWriter::new();
//! let node = Arc::new(AodvNode::new(address, AodvConfig::default(), Arc::new(writer))?);
//!
//! // Receive path
//! node.on_route_request(packet)?;
//!
//! // Forwarding path
//! match node.resolve(&dest)? {
//!     RouteDecision::Local => { /* deliver */ }
//!     RouteDecision::NextHop(hop) => { /* forward to hop */ }
//!     RouteDecision::NoRoute(reason) => { /* try again later */ }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod node;
pub mod resolver;
pub mod rreq;
pub mod table;

// Re-export main types
pub use client::ClientTable;
pub use config::AodvConfig;
pub use error::{RoutingError, RoutingResult, TableKind};
pub use node::{AodvNode, ReplyOutcome, RequestOutcome};
pub use resolver::{NoRouteReason, RouteDecision, RouteResolver};
pub use rreq::{RreqEntry, RreqTable};
pub use table::{RouteKey, RouteLookup, RouteState, RoutingEntry, RoutingTable, UpdateOutcome};
