//! Routing table
//!
//! The [`RoutingTable`] holds the best known route per
//! (destination, metric type). Routes decay with disuse:
//!
//! - used within `ACTIVE_INTERVAL`: **Active**
//! - unused longer than that but within `ACTIVE_INTERVAL + MAX_IDLETIME`: **Idle**
//!   (still usable)
//! - unused beyond that: expired, treated as absent and reclaimed on the
//!   next access
//!
//! **Broken** is only ever set explicitly, by a lost link or a received
//! route error. Broken routes are kept so their last sequence number can be
//! reported, but never yield a next hop.
//!
//! Updates follow the loop-prevention rule: an existing route is replaced
//! only by a fresher sequence number, or by the same sequence number with a
//! strictly lower metric.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aodv_core::constants::HOST_PREFIX_LENGTH;
use aodv_core::{Clock, MetricType, NodeAddress, SeqNum, UnreachableNode};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::AodvConfig;
use crate::error::{RoutingError, RoutingResult, TableKind};

/// Observed state of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// Used recently
    Active,
    /// Not used for a while, still valid
    Idle,
    /// Invalidated by a link break or route error
    Broken,
}

impl Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteState::Active => write!(f, "active"),
            RouteState::Idle => write!(f, "idle"),
            RouteState::Broken => write!(f, "broken"),
        }
    }
}

/// A route to a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEntry {
    /// The destination address
    pub destination: NodeAddress,
    /// Network prefix length of the destination
    pub prefix_length: u8,
    /// Destination sequence number as last advertised
    pub seq_num: SeqNum,
    /// Neighbor to forward to
    pub next_hop: NodeAddress,
    /// Metric type of `metric`
    pub metric_type: MetricType,
    /// Cost to the destination (lower is better)
    pub metric: u8,
    /// When the route was last used or refreshed
    pub last_used: Instant,
    /// When the route expires unless used again
    pub expiration_time: Instant,
    /// Route state
    pub state: RouteState,
}

impl RoutingEntry {
    /// Create a host route
    ///
    /// `last_used`, `expiration_time` and `state` are assigned by the table
    /// when the entry is stored.
    pub fn new(
        destination: NodeAddress,
        next_hop: NodeAddress,
        seq_num: SeqNum,
        metric_type: MetricType,
        metric: u8,
    ) -> Self {
        let now = Instant::now();
        Self {
            destination,
            prefix_length: HOST_PREFIX_LENGTH,
            seq_num,
            next_hop,
            metric_type,
            metric,
            last_used: now,
            expiration_time: now,
            state: RouteState::Active,
        }
    }

    /// Key of this entry in the table
    pub fn key(&self) -> RouteKey {
        (self.destination, self.metric_type)
    }

    /// Check if the route is usable for forwarding
    pub fn is_usable(&self) -> bool {
        self.state != RouteState::Broken
    }

    /// Check whether this entry should replace `stored`
    ///
    /// Sequence number 0 means "unknown" and is not ordered against known
    /// numbers: a known number always wins over an unknown one, two unknown
    /// numbers fall through to the metric comparison.
    pub fn supersedes(&self, stored: &RoutingEntry) -> bool {
        match (self.seq_num.is_unknown(), stored.seq_num.is_unknown()) {
            (false, true) => true,
            (true, false) => false,
            _ => {
                self.seq_num.is_fresher_than(stored.seq_num)
                    || (self.seq_num == stored.seq_num && self.metric < stored.metric)
            }
        }
    }
}

/// Routing table key
pub type RouteKey = (NodeAddress, MetricType);

/// Result of [`RoutingTable::add_or_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No route existed, the entry was inserted
    Inserted,
    /// The entry replaced a worse route
    Updated,
    /// An equal or better route is already stored
    Rejected,
}

/// Result of [`RoutingTable::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteLookup {
    /// Usable route; its last-used time was refreshed
    Usable(NodeAddress),
    /// Route exists but is broken; carries its last sequence number
    Broken(SeqNum),
    /// No route, or the route expired
    Missing,
}

/// Bounded routing table with lazy expiration
pub struct RoutingTable {
    routes: RwLock<HashMap<RouteKey, RoutingEntry>>,
    capacity: usize,
    active_interval: Duration,
    max_idletime: Duration,
    clock: Arc<dyn Clock>,
}

impl RoutingTable {
    /// Create a routing table sized and timed by `config`
    pub fn new(config: &AodvConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(
            config.max_routing_entries,
            config.active_interval,
            config.max_idletime,
            clock,
        )
    }

    /// Create a routing table with explicit limits
    pub fn with_limits(
        capacity: usize,
        active_interval: Duration,
        max_idletime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            routes: RwLock::new(HashMap::with_capacity(capacity)),
            capacity,
            active_interval,
            max_idletime,
            clock,
        }
    }

    fn lifetime(&self) -> Duration {
        self.active_interval + self.max_idletime
    }

    fn is_expired(&self, entry: &RoutingEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_used) > self.lifetime()
    }

    fn observed(&self, entry: &RoutingEntry, now: Instant) -> RoutingEntry {
        let mut observed = entry.clone();
        if observed.state != RouteState::Broken
            && now.saturating_duration_since(entry.last_used) > self.active_interval
        {
            observed.state = RouteState::Idle;
        }
        observed
    }

    fn touch(&self, entry: &mut RoutingEntry, now: Instant) {
        entry.last_used = now;
        entry.expiration_time = now + self.lifetime();
    }

    /// Remove the entry at `key` if it has expired; returns true if removed
    fn reclaim_if_expired(
        &self,
        routes: &mut HashMap<RouteKey, RoutingEntry>,
        key: &RouteKey,
        now: Instant,
    ) -> bool {
        let expired = routes
            .get(key)
            .is_some_and(|entry| self.is_expired(entry, now));
        if expired {
            routes.remove(key);
            trace!(dest = %key.0, metric_type = %key.1, "Reclaimed expired route");
        }
        expired
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.routes.write().clear();
    }

    /// Insert a route or improve an existing one
    ///
    /// A new entry starts `Active` with `last_used = now`. An existing entry
    /// is replaced only when the incoming one [supersedes](RoutingEntry::supersedes)
    /// it; the replacement is also `Active` and freshly used, which repairs a
    /// broken route. Anything else is rejected without touching the stored
    /// entry.
    pub fn add_or_update(&self, entry: RoutingEntry) -> RoutingResult<UpdateOutcome> {
        let now = self.clock.now();
        let key = entry.key();
        let mut routes = self.routes.write();

        self.reclaim_if_expired(&mut routes, &key, now);

        if let Some(existing) = routes.get_mut(&key) {
            if !entry.supersedes(existing) {
                trace!(
                    dest = %entry.destination,
                    seq_num = %entry.seq_num,
                    stored_seq_num = %existing.seq_num,
                    metric = entry.metric,
                    stored_metric = existing.metric,
                    "Rejected stale or worse route"
                );
                return Ok(UpdateOutcome::Rejected);
            }
            *existing = entry;
            existing.state = RouteState::Active;
            self.touch(existing, now);
            debug!(
                dest = %existing.destination,
                next_hop = %existing.next_hop,
                seq_num = %existing.seq_num,
                metric = existing.metric,
                "Route updated"
            );
            return Ok(UpdateOutcome::Updated);
        }

        if routes.len() >= self.capacity {
            routes.retain(|_, stored| !self.is_expired(stored, now));
            if routes.len() >= self.capacity {
                return Err(RoutingError::CapacityExceeded {
                    table: TableKind::Routing,
                    capacity: self.capacity,
                });
            }
        }

        let mut entry = entry;
        entry.state = RouteState::Active;
        self.touch(&mut entry, now);
        debug!(
            dest = %entry.destination,
            next_hop = %entry.next_hop,
            seq_num = %entry.seq_num,
            metric = entry.metric,
            "Route added"
        );
        routes.insert(key, entry);
        Ok(UpdateOutcome::Inserted)
    }

    /// Get the route to a destination
    ///
    /// Returns `None` if no route exists or it expired (the expired entry is
    /// removed). The returned state is the observed one: `Idle` once unused
    /// for longer than the active interval. Does not count as a use.
    pub fn get_entry(&self, dest: &NodeAddress, metric_type: MetricType) -> Option<RoutingEntry> {
        let now = self.clock.now();
        let key = (*dest, metric_type);
        let mut routes = self.routes.write();

        if self.reclaim_if_expired(&mut routes, &key, now) {
            return None;
        }
        routes.get(&key).map(|entry| self.observed(entry, now))
    }

    /// Look up a route for forwarding
    ///
    /// Usable routes have their last-used time refreshed. This is a single
    /// atomic step, so a route cannot be marked broken between the check
    /// and the refresh.
    pub fn lookup(&self, dest: &NodeAddress, metric_type: MetricType) -> RouteLookup {
        let now = self.clock.now();
        let key = (*dest, metric_type);
        let mut routes = self.routes.write();

        if self.reclaim_if_expired(&mut routes, &key, now) {
            return RouteLookup::Missing;
        }
        match routes.get_mut(&key) {
            None => RouteLookup::Missing,
            Some(entry) if entry.state == RouteState::Broken => RouteLookup::Broken(entry.seq_num),
            Some(entry) => {
                entry.state = RouteState::Active;
                self.touch(entry, now);
                RouteLookup::Usable(entry.next_hop)
            }
        }
    }

    /// Get the next hop toward a destination
    ///
    /// Refreshes the route's last-used time. Returns `None` for absent,
    /// expired and broken routes.
    pub fn get_next_hop(&self, dest: &NodeAddress, metric_type: MetricType) -> Option<NodeAddress> {
        match self.lookup(dest, metric_type) {
            RouteLookup::Usable(next_hop) => Some(next_hop),
            RouteLookup::Broken(_) | RouteLookup::Missing => None,
        }
    }

    /// Remove the route to a destination (no-op if absent)
    pub fn delete_entry(&self, dest: &NodeAddress, metric_type: MetricType) {
        if self.routes.write().remove(&(*dest, metric_type)).is_some() {
            debug!(dest = %dest, metric_type = %metric_type, "Route deleted");
        }
    }

    /// Mark the route to a destination as broken
    ///
    /// The entry is kept so its sequence number stays available for route
    /// errors. Returns `false` if no (unexpired) route exists.
    pub fn mark_broken(&self, dest: &NodeAddress, metric_type: MetricType) -> bool {
        let now = self.clock.now();
        let key = (*dest, metric_type);
        let mut routes = self.routes.write();

        if self.reclaim_if_expired(&mut routes, &key, now) {
            return false;
        }
        match routes.get_mut(&key) {
            Some(entry) => {
                entry.state = RouteState::Broken;
                debug!(dest = %dest, seq_num = %entry.seq_num, "Route marked broken");
                true
            }
            None => false,
        }
    }

    /// Mark every route through `next_hop` as broken
    ///
    /// Returns the destinations that became unreachable, with their last
    /// known sequence numbers. Routes that were already broken are not
    /// reported again.
    pub fn mark_broken_via(&self, next_hop: &NodeAddress) -> Vec<UnreachableNode> {
        let now = self.clock.now();
        let mut routes = self.routes.write();
        routes.retain(|_, entry| !self.is_expired(entry, now));

        routes
            .values_mut()
            .filter(|entry| entry.next_hop == *next_hop && entry.state != RouteState::Broken)
            .map(|entry| {
                entry.state = RouteState::Broken;
                UnreachableNode::new(entry.destination, entry.seq_num)
            })
            .collect()
    }

    /// Remove the least recently used route
    ///
    /// Used by callers that prefer evicting soft state over rejecting a new
    /// route when the table is full.
    pub fn evict_least_recently_used(&self) -> Option<RoutingEntry> {
        let mut routes = self.routes.write();
        let key = routes
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key)?;
        let evicted = routes.remove(&key);
        if let Some(entry) = &evicted {
            warn!(dest = %entry.destination, "Evicted least recently used route");
        }
        evicted
    }

    /// Remove all expired routes
    ///
    /// Optional: expired routes are never returned whether or not this has
    /// run. Returns the number of routes removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut routes = self.routes.write();
        let before = routes.len();
        routes.retain(|_, entry| !self.is_expired(entry, now));
        before - routes.len()
    }

    /// Get all unexpired routes with their observed state
    pub fn entries(&self) -> Vec<RoutingEntry> {
        let now = self.clock.now();
        self.routes
            .read()
            .values()
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| self.observed(entry, now))
            .collect()
    }

    /// Get the number of stored routes, including expired ones not yet reclaimed
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

impl Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let now = self.clock.now();
        let mut entries = self.entries();
        entries.sort_by_key(|entry| entry.key());

        writeln!(f, "===== BEGIN ROUTING TABLE ===================")?;
        for entry in &entries {
            let remaining = entry.expiration_time.saturating_duration_since(now);
            writeln!(
                f,
                "{}/{} via {} seq {} {} {} [{}] expires in {}s",
                entry.destination,
                entry.prefix_length,
                entry.next_hop,
                entry.seq_num,
                entry.metric_type,
                entry.metric,
                entry.state,
                remaining.as_secs()
            )?;
        }
        write!(f, "===== END ROUTING TABLE =====================")
    }
}
