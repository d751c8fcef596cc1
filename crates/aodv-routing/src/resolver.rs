//! Next-hop resolution for the forwarding path
//!
//! The [`RouteResolver`] answers "where do I send a packet for this
//! destination?" synchronously and without blocking:
//!
//! 1. **LOCAL**: the destination is a client of this node
//! 2. **BROKEN**: a route exists but is broken; report it in a route error
//! 3. **NEXT HOP**: a usable route exists; refresh it and return its next hop
//! 4. **DISCOVER**: no route; flood a route request and report no route
//!
//! Route discovery completes asynchronously. Callers observe it by asking
//! again later, or by awaiting [`RouteResolver::discover`].

use std::sync::Arc;
use std::time::Duration;

use aodv_core::{
    Clock, MetricType, NodeAddress, NodeData, PacketData, PacketWriter, SeqNum, SequenceNumber,
    UnreachableNode,
};
use tracing::{debug, instrument};

use crate::client::ClientTable;
use crate::config::AodvConfig;
use crate::error::{RoutingError, RoutingResult};
use crate::rreq::RreqTable;
use crate::table::{RouteLookup, RoutingTable};

/// Why no next hop could be given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRouteReason {
    /// No route was known; a route request has been sent
    DiscoveryStarted,
    /// The route is broken; a route error has been sent
    RouteBroken,
}

/// Outcome of resolving a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Destination is served by this node, no hop needed
    Local,
    /// Forward to this neighbor
    NextHop(NodeAddress),
    /// No route right now; try again later
    NoRoute(NoRouteReason),
}

impl RouteDecision {
    /// Get the next hop, if any
    pub fn next_hop(&self) -> Option<NodeAddress> {
        match self {
            Self::NextHop(hop) => Some(*hop),
            _ => None,
        }
    }

    /// Check if this is a local delivery decision
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Check if this is a no-route decision
    pub fn is_no_route(&self) -> bool {
        matches!(self, Self::NoRoute(_))
    }
}

/// Synchronous next-hop resolver
pub struct RouteResolver {
    address: NodeAddress,
    multicast: NodeAddress,
    metric_type: MetricType,
    max_hopcount: u8,
    discovery_attempts: u32,
    rreq_wait_time: Duration,
    seq_num: Arc<SequenceNumber>,
    clients: Arc<ClientTable>,
    routing_table: Arc<RoutingTable>,
    rreq_table: Arc<RreqTable>,
    writer: Arc<dyn PacketWriter>,
    clock: Arc<dyn Clock>,
}

impl RouteResolver {
    /// Create a resolver for the node at `address`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: NodeAddress,
        config: &AodvConfig,
        seq_num: Arc<SequenceNumber>,
        clients: Arc<ClientTable>,
        routing_table: Arc<RoutingTable>,
        rreq_table: Arc<RreqTable>,
        writer: Arc<dyn PacketWriter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            address,
            multicast: NodeAddress::all_nodes_multicast(),
            metric_type: config.metric_type,
            max_hopcount: config.max_hopcount,
            discovery_attempts: config.discovery_attempts_max,
            rreq_wait_time: config.rreq_wait_time,
            seq_num,
            clients,
            routing_table,
            rreq_table,
            writer,
            clock,
        }
    }

    /// Resolve the next hop toward `dest`
    ///
    /// Never blocks. `NoRoute` is the expected answer while a discovery is
    /// in flight. Multicast and unspecified destinations are rejected with
    /// [`RoutingError::InvalidDestination`] before any table is consulted.
    #[instrument(skip(self, dest), fields(dest = %dest))]
    pub fn resolve(&self, dest: &NodeAddress) -> RoutingResult<RouteDecision> {
        if !dest.is_routable() {
            debug!("Rejected unroutable destination");
            return Err(RoutingError::InvalidDestination(*dest));
        }

        if self.clients.is_client(dest) {
            return Ok(RouteDecision::Local);
        }

        match self.routing_table.lookup(dest, self.metric_type) {
            RouteLookup::Usable(next_hop) => {
                debug!(next_hop = %next_hop, "Route found");
                Ok(RouteDecision::NextHop(next_hop))
            }
            RouteLookup::Broken(seq_num) => {
                debug!(seq_num = %seq_num, "Route broken, sending route error");
                self.writer.send_route_error(
                    &[UnreachableNode::new(*dest, seq_num)],
                    self.max_hopcount,
                    self.multicast,
                );
                Ok(RouteDecision::NoRoute(NoRouteReason::RouteBroken))
            }
            RouteLookup::Missing => {
                debug!("No route, starting route discovery");
                self.originate_route_request(dest);
                Ok(RouteDecision::NoRoute(NoRouteReason::DiscoveryStarted))
            }
        }
    }

    /// Flood a route request for `dest` with a fresh own sequence number
    ///
    /// The request is entered in the route request table first so that
    /// copies flooded back by neighbors are recognized as redundant.
    fn originate_route_request(&self, dest: &NodeAddress) {
        let packet = PacketData {
            hop_limit: self.max_hopcount,
            sender: self.address,
            metric_type: self.metric_type,
            orig_node: NodeData::new(self.address, 0, self.seq_num.advance()),
            targ_node: NodeData::new(*dest, 0, SeqNum::UNKNOWN),
            timestamp: self.clock.now(),
        };
        self.rreq_table.is_redundant(&packet);
        self.writer.send_route_request(&packet, self.multicast);
    }

    /// Resolve `dest`, retrying route discovery until a route appears
    ///
    /// Sends at most `discovery_attempts_max` route requests, waiting
    /// `rreq_wait_time` after each. A broken route ends the attempt at once:
    /// it fails closed until fresher routing information repairs it.
    pub async fn discover(&self, dest: &NodeAddress) -> RoutingResult<RouteDecision> {
        for attempt in 1..=self.discovery_attempts {
            match self.resolve(dest)? {
                RouteDecision::NoRoute(NoRouteReason::DiscoveryStarted) => {
                    debug!(dest = %dest, attempt, "Waiting for route reply");
                    tokio::time::sleep(self.rreq_wait_time).await;
                }
                RouteDecision::NoRoute(NoRouteReason::RouteBroken) => {
                    return Err(RoutingError::DiscoveryFailed {
                        destination: *dest,
                        attempts: attempt,
                    });
                }
                decision => return Ok(decision),
            }
        }

        // A reply to the last request may have arrived during the final wait
        if let Some(next_hop) = self.routing_table.get_next_hop(dest, self.metric_type) {
            return Ok(RouteDecision::NextHop(next_hop));
        }

        Err(RoutingError::DiscoveryFailed {
            destination: *dest,
            attempts: self.discovery_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aodv_core::{ChannelWriter, ManualClock, OutboundMessage};
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::table::RoutingEntry;

    struct Fixture {
        resolver: RouteResolver,
        routing_table: Arc<RoutingTable>,
        rreq_table: Arc<RreqTable>,
        clock: ManualClock,
        rx: UnboundedReceiver<OutboundMessage>,
    }

    fn addr(s: &str) -> NodeAddress {
        s.parse().unwrap()
    }

    fn setup(config: AodvConfig) -> Fixture {
        let clock = ManualClock::new();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let clients = Arc::new(ClientTable::new(config.max_clients));
        clients.add(addr("::1")).unwrap();
        let routing_table = Arc::new(RoutingTable::new(&config, shared_clock.clone()));
        let rreq_table = Arc::new(RreqTable::new(&config, shared_clock.clone()));
        let (writer, rx) = ChannelWriter::new();

        let resolver = RouteResolver::new(
            addr("::1"),
            &config,
            Arc::new(SequenceNumber::new()),
            clients,
            routing_table.clone(),
            rreq_table.clone(),
            Arc::new(writer),
            shared_clock,
        );

        Fixture {
            resolver,
            routing_table,
            rreq_table,
            clock,
            rx,
        }
    }

    fn make_route(dest: &str, next_hop: &str, seq: u16) -> RoutingEntry {
        RoutingEntry::new(addr(dest), addr(next_hop), SeqNum::new(seq), MetricType::HOP_COUNT, 2)
    }

    #[test]
    fn test_invalid_destination() {
        let f = setup(AodvConfig::default());

        for dest in [NodeAddress::all_nodes_multicast(), NodeAddress::unspecified()] {
            let result = f.resolver.resolve(&dest);
            assert!(matches!(result, Err(RoutingError::InvalidDestination(d)) if d == dest));
        }
    }

    #[test]
    fn test_client_is_local() {
        let mut f = setup(AodvConfig::default());
        assert_eq!(f.resolver.resolve(&addr("::1")).unwrap(), RouteDecision::Local);
        assert!(f.rx.try_recv().is_err());
    }

    #[test]
    fn test_miss_starts_discovery() {
        let mut f = setup(AodvConfig::default());

        let decision = f.resolver.resolve(&addr("::23")).unwrap();
        assert_eq!(decision, RouteDecision::NoRoute(NoRouteReason::DiscoveryStarted));

        match f.rx.try_recv().unwrap() {
            OutboundMessage::RouteRequest {
                packet,
                destination,
            } => {
                assert_eq!(destination, NodeAddress::all_nodes_multicast());
                assert_eq!(packet.orig_node.addr, addr("::1"));
                assert_eq!(packet.targ_node.addr, addr("::23"));
                assert_eq!(packet.orig_node.seq_num, SeqNum::new(1));
                assert_eq!(packet.orig_node.metric, 0);
            }
            other => panic!("Expected RouteRequest, got {:?}", other),
        }
        assert!(f.rx.try_recv().is_err());

        // Our own request is remembered, so echoes are redundant
        assert!(f.rreq_table.get(&addr("::1"), &addr("::23")).is_some());
    }

    #[test]
    fn test_each_miss_uses_fresh_sequence_number() {
        let mut f = setup(AodvConfig::default());
        f.resolver.resolve(&addr("::23")).unwrap();
        f.resolver.resolve(&addr("::23")).unwrap();

        let seqs: Vec<SeqNum> = std::iter::from_fn(|| f.rx.try_recv().ok())
            .filter_map(|msg| match msg {
                OutboundMessage::RouteRequest { packet, .. } => Some(packet.orig_node.seq_num),
                _ => None,
            })
            .collect();
        assert_eq!(seqs, vec![SeqNum::new(1), SeqNum::new(2)]);
    }

    #[test]
    fn test_usable_route_returns_next_hop() {
        let mut f = setup(AodvConfig::default());
        f.routing_table.add_or_update(make_route("::23", "::42", 6)).unwrap();

        let decision = f.resolver.resolve(&addr("::23")).unwrap();
        assert_eq!(decision, RouteDecision::NextHop(addr("::42")));
        assert_eq!(decision.next_hop(), Some(addr("::42")));
        assert!(f.rx.try_recv().is_err());
    }

    #[test]
    fn test_resolve_refreshes_route() {
        let f = setup(AodvConfig::default());
        let lifetime = AodvConfig::default().route_lifetime();
        f.routing_table.add_or_update(make_route("::23", "::42", 6)).unwrap();

        f.clock.advance(lifetime - Duration::from_secs(1));
        assert!(f.resolver.resolve(&addr("::23")).unwrap().next_hop().is_some());
        f.clock.advance(lifetime - Duration::from_secs(1));
        assert!(f.resolver.resolve(&addr("::23")).unwrap().next_hop().is_some());
    }

    #[test]
    fn test_broken_route_fails_closed() {
        let mut f = setup(AodvConfig::default());
        f.routing_table.add_or_update(make_route("::23", "::42", 6)).unwrap();
        f.routing_table.mark_broken(&addr("::23"), MetricType::HOP_COUNT);

        let decision = f.resolver.resolve(&addr("::23")).unwrap();
        assert_eq!(decision, RouteDecision::NoRoute(NoRouteReason::RouteBroken));
        assert_eq!(decision.next_hop(), None);

        match f.rx.try_recv().unwrap() {
            OutboundMessage::RouteError {
                unreachable,
                hop_limit,
                destination,
            } => {
                assert_eq!(unreachable, vec![UnreachableNode::new(addr("::23"), SeqNum::new(6))]);
                assert_eq!(hop_limit, AodvConfig::default().max_hopcount);
                assert_eq!(destination, NodeAddress::all_nodes_multicast());
            }
            other => panic!("Expected RouteError, got {:?}", other),
        }
        assert!(f.rx.try_recv().is_err());
    }

    #[test]
    fn test_expired_route_triggers_discovery() {
        let mut f = setup(AodvConfig::default());
        f.routing_table.add_or_update(make_route("::23", "::42", 6)).unwrap();
        f.clock.advance(AodvConfig::default().route_lifetime() + Duration::from_secs(1));

        let decision = f.resolver.resolve(&addr("::23")).unwrap();
        assert_eq!(decision, RouteDecision::NoRoute(NoRouteReason::DiscoveryStarted));
        assert!(f.rx.try_recv().unwrap().is_route_request());
    }

    #[tokio::test]
    async fn test_discover_gives_up_after_attempts() {
        let config = AodvConfig::default().with_discovery(3, Duration::from_millis(5));
        let mut f = setup(config);

        let result = f.resolver.discover(&addr("::23")).await;
        assert!(matches!(
            result,
            Err(RoutingError::DiscoveryFailed { attempts: 3, .. })
        ));

        let mut requests = 0;
        while let Ok(msg) = f.rx.try_recv() {
            assert!(msg.is_route_request());
            requests += 1;
        }
        assert_eq!(requests, 3);
    }

    #[tokio::test]
    async fn test_discover_returns_known_route() {
        let config = AodvConfig::default().with_discovery(3, Duration::from_millis(5));
        let f = setup(config);
        f.routing_table.add_or_update(make_route("::23", "::42", 6)).unwrap();

        let decision = f.resolver.discover(&addr("::23")).await.unwrap();
        assert_eq!(decision, RouteDecision::NextHop(addr("::42")));
    }

    #[tokio::test]
    async fn test_discover_stops_on_broken_route() {
        let config = AodvConfig::default().with_discovery(3, Duration::from_millis(5));
        let f = setup(config);
        f.routing_table.add_or_update(make_route("::23", "::42", 6)).unwrap();
        f.routing_table.mark_broken(&addr("::23"), MetricType::HOP_COUNT);

        let result = f.resolver.discover(&addr("::23")).await;
        assert!(matches!(
            result,
            Err(RoutingError::DiscoveryFailed { attempts: 1, .. })
        ));
    }
}
