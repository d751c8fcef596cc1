//! The per-node routing context
//!
//! [`AodvNode`] owns everything one node needs to take part in route
//! discovery: its address, its sequence number, the client, routing and
//! route request tables, and the [`PacketWriter`] control messages leave
//! through. It is constructed once and shared as `Arc<AodvNode>` between
//! the receive path (the `on_*` handlers) and the forwarding path
//! ([`resolve`](AodvNode::resolve)).
//!
//! ## Inbound flow
//!
//! ```text
//! RREQ ──► dedup ──► learn reverse route ──► target is a client? ──► RREP to sender
//!                                                  │
//!                                                  └──► forward to multicast
//!
//! RREP ──► learn forward route ──► origin is a client? ──► delivered
//!                                        │
//!                                        └──► forward toward origin
//! ```

use std::sync::Arc;

use aodv_core::{
    Clock, CoreError, MetricType, NodeAddress, NodeData, PacketData, PacketWriter, SeqNum,
    SequenceNumber, SystemClock, UnreachableNode, add_link_cost,
};
use tracing::{debug, instrument, warn};

use crate::client::ClientTable;
use crate::config::AodvConfig;
use crate::error::{RoutingError, RoutingResult};
use crate::resolver::{RouteDecision, RouteResolver};
use crate::rreq::RreqTable;
use crate::table::{RoutingEntry, RoutingTable, UpdateOutcome};

/// What happened to an inbound route request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Seen before with an equal or better path
    Redundant,
    /// Target is a client; a route reply was sent
    Replied,
    /// Flooded on to the neighbors
    Forwarded,
    /// Unroutable, looped back, stale, or out of hops
    Dropped,
}

/// What happened to an inbound route reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Origin is a client; discovery is complete
    Delivered,
    /// Sent on toward the origin
    Forwarded,
    /// Stale, unroutable, or out of hops
    Dropped,
}

/// Routing state and protocol logic of one node
pub struct AodvNode {
    address: NodeAddress,
    multicast: NodeAddress,
    config: AodvConfig,
    seq_num: Arc<SequenceNumber>,
    clients: Arc<ClientTable>,
    routing_table: Arc<RoutingTable>,
    rreq_table: Arc<RreqTable>,
    resolver: RouteResolver,
    writer: Arc<dyn PacketWriter>,
    clock: Arc<dyn Clock>,
}

impl AodvNode {
    /// Create a node using the system clock
    pub fn new(
        address: NodeAddress,
        config: AodvConfig,
        writer: Arc<dyn PacketWriter>,
    ) -> RoutingResult<Self> {
        Self::with_clock(address, config, writer, Arc::new(SystemClock))
    }

    /// Create a node with a custom clock
    ///
    /// The node's own address becomes its first client. Fails for a
    /// non-routable address and for any metric type other than hop count.
    pub fn with_clock(
        address: NodeAddress,
        config: AodvConfig,
        writer: Arc<dyn PacketWriter>,
        clock: Arc<dyn Clock>,
    ) -> RoutingResult<Self> {
        if !address.is_routable() {
            return Err(CoreError::InvalidAddress(address.to_string()).into());
        }
        if config.metric_type != MetricType::HOP_COUNT {
            return Err(RoutingError::UnsupportedMetricType(config.metric_type));
        }

        let seq_num = Arc::new(SequenceNumber::new());
        let clients = Arc::new(ClientTable::new(config.max_clients));
        let routing_table = Arc::new(RoutingTable::new(&config, clock.clone()));
        let rreq_table = Arc::new(RreqTable::new(&config, clock.clone()));
        clients.add(address)?;

        let resolver = RouteResolver::new(
            address,
            &config,
            seq_num.clone(),
            clients.clone(),
            routing_table.clone(),
            rreq_table.clone(),
            writer.clone(),
            clock.clone(),
        );

        debug!(address = %address, metric_type = %config.metric_type, "AODVv2 node created");

        Ok(Self {
            address,
            multicast: NodeAddress::all_nodes_multicast(),
            config,
            seq_num,
            clients,
            routing_table,
            rreq_table,
            resolver,
            writer,
            clock,
        })
    }

    /// Get this node's address
    pub fn address(&self) -> NodeAddress {
        self.address
    }

    /// Get the configuration
    pub fn config(&self) -> &AodvConfig {
        &self.config
    }

    /// Get the metric type routes are selected by
    pub fn metric_type(&self) -> MetricType {
        self.config.metric_type
    }

    /// Get the current own sequence number
    pub fn seq_num(&self) -> SeqNum {
        self.seq_num.current()
    }

    pub fn client_table(&self) -> &ClientTable {
        &self.clients
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub fn rreq_table(&self) -> &RreqTable {
        &self.rreq_table
    }

    /// Serve an additional client address from this node
    pub fn add_client(&self, addr: NodeAddress) -> RoutingResult<()> {
        if !addr.is_routable() {
            return Err(RoutingError::InvalidDestination(addr));
        }
        self.clients.add(addr)
    }

    /// Forget all routing state
    ///
    /// Clears the three tables and re-registers the own address as a client.
    /// The sequence number keeps counting so neighbors still see fresh
    /// numbers from this node.
    pub fn reset(&self) -> RoutingResult<()> {
        self.clients.clear();
        self.routing_table.clear();
        self.rreq_table.clear();
        self.clients.add(self.address)?;
        debug!(address = %self.address, "Routing state reset");
        Ok(())
    }

    /// Resolve the next hop toward `dest`; see [`RouteResolver::resolve`]
    pub fn resolve(&self, dest: &NodeAddress) -> RoutingResult<RouteDecision> {
        self.resolver.resolve(dest)
    }

    /// Resolve `dest`, waiting for route discovery; see [`RouteResolver::discover`]
    pub async fn discover(&self, dest: &NodeAddress) -> RoutingResult<RouteDecision> {
        self.resolver.discover(dest).await
    }

    /// Store a route, evicting the least recently used one if the table is full
    fn learn_route(&self, entry: RoutingEntry) -> RoutingResult<UpdateOutcome> {
        match self.routing_table.add_or_update(entry.clone()) {
            Err(RoutingError::CapacityExceeded { .. }) => {
                self.routing_table.purge_expired();
                self.routing_table.evict_least_recently_used();
                self.routing_table.add_or_update(entry)
            }
            result => result,
        }
    }

    /// Handle a route request received from a neighbor
    #[instrument(
        skip(self, packet),
        fields(
            origin = %packet.orig_node.addr,
            target = %packet.targ_node.addr,
            sender = %packet.sender,
        )
    )]
    pub fn on_route_request(&self, mut packet: PacketData) -> RoutingResult<RequestOutcome> {
        let origin = packet.orig_node.addr;
        let target = packet.targ_node.addr;

        if !origin.is_routable() || !target.is_routable() || !packet.sender.is_routable() {
            debug!("Dropped route request with unroutable address");
            return Ok(RequestOutcome::Dropped);
        }
        if self.clients.is_client(&origin) {
            // Our own request flooded back to us
            return Ok(RequestOutcome::Dropped);
        }
        if self.rreq_table.is_redundant(&packet) {
            return Ok(RequestOutcome::Redundant);
        }

        let metric = add_link_cost(packet.orig_node.metric, packet.metric_type);
        let outcome = self.learn_route(RoutingEntry::new(
            origin,
            packet.sender,
            packet.orig_node.seq_num,
            packet.metric_type,
            metric,
        ))?;
        if outcome == UpdateOutcome::Rejected {
            debug!("Route request carries no better route to origin, dropped");
            return Ok(RequestOutcome::Dropped);
        }

        if self.clients.is_client(&target) {
            let reply = PacketData {
                hop_limit: self.config.max_hopcount,
                sender: self.address,
                metric_type: packet.metric_type,
                orig_node: packet.orig_node,
                targ_node: NodeData::new(target, 0, self.seq_num.advance()),
                timestamp: self.clock.now(),
            };
            debug!(seq_num = %reply.targ_node.seq_num, "Target is a client, sending route reply");
            self.writer.send_route_reply(&reply, packet.sender);
            return Ok(RequestOutcome::Replied);
        }

        if packet.hop_limit <= 1 {
            debug!("Hop limit exhausted, route request not forwarded");
            return Ok(RequestOutcome::Dropped);
        }

        packet.hop_limit -= 1;
        packet.orig_node.metric = metric;
        packet.sender = self.address;
        debug!(hop_limit = packet.hop_limit, metric, "Forwarding route request");
        self.writer.send_route_request(&packet, self.multicast);
        Ok(RequestOutcome::Forwarded)
    }

    /// Handle a route reply received from a neighbor
    #[instrument(
        skip(self, packet),
        fields(
            origin = %packet.orig_node.addr,
            target = %packet.targ_node.addr,
            sender = %packet.sender,
        )
    )]
    pub fn on_route_reply(&self, mut packet: PacketData) -> RoutingResult<ReplyOutcome> {
        let origin = packet.orig_node.addr;
        let target = packet.targ_node.addr;

        if !origin.is_routable() || !target.is_routable() || !packet.sender.is_routable() {
            debug!("Dropped route reply with unroutable address");
            return Ok(ReplyOutcome::Dropped);
        }

        let metric = add_link_cost(packet.targ_node.metric, packet.metric_type);
        let outcome = self.learn_route(RoutingEntry::new(
            target,
            packet.sender,
            packet.targ_node.seq_num,
            packet.metric_type,
            metric,
        ))?;
        if outcome == UpdateOutcome::Rejected {
            debug!("Route reply carries no better route, dropped");
            return Ok(ReplyOutcome::Dropped);
        }

        if self.clients.is_client(&origin) {
            debug!(metric, "Route discovery complete");
            return Ok(ReplyOutcome::Delivered);
        }

        let Some(next_hop) = self.routing_table.get_next_hop(&origin, packet.metric_type) else {
            warn!("No route back to origin, route reply dropped");
            return Ok(ReplyOutcome::Dropped);
        };
        if packet.hop_limit <= 1 {
            debug!("Hop limit exhausted, route reply not forwarded");
            return Ok(ReplyOutcome::Dropped);
        }

        packet.hop_limit -= 1;
        packet.targ_node.metric = metric;
        packet.sender = self.address;
        debug!(next_hop = %next_hop, hop_limit = packet.hop_limit, "Forwarding route reply");
        self.writer.send_route_reply(&packet, next_hop);
        Ok(ReplyOutcome::Forwarded)
    }

    /// Handle a route error; returns how many routes were marked broken
    #[instrument(skip(self, unreachable), fields(count = unreachable.len()))]
    pub fn on_route_error(&self, unreachable: &[UnreachableNode]) -> usize {
        let marked = unreachable
            .iter()
            .filter(|node| self.routing_table.mark_broken(&node.addr, self.config.metric_type))
            .count();
        debug!(marked, "Processed route error");
        marked
    }

    /// Handle the loss of the link to a neighbor
    ///
    /// Every route through the neighbor is marked broken and announced in a
    /// single route error. Returns the destinations announced.
    #[instrument(skip(self), fields(neighbor = %neighbor))]
    pub fn on_link_break(&self, neighbor: NodeAddress) -> Vec<UnreachableNode> {
        let unreachable = self.routing_table.mark_broken_via(&neighbor);
        if !unreachable.is_empty() {
            debug!(count = unreachable.len(), "Announcing routes lost with link");
            self.writer
                .send_route_error(&unreachable, self.config.max_hopcount, self.multicast);
        }
        unreachable
    }
}
