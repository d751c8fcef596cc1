//! Route request table
//!
//! Route requests are flooded, so every node sees the same request many
//! times over different paths. The [`RreqTable`] remembers the best request
//! seen per (origin, target) and tells the caller whether a new one carries
//! anything new: a fresher sequence number or a cheaper path. Requests that
//! don't are redundant and must be neither processed nor forwarded.
//!
//! Entries are forgotten once older than `MAX_IDLETIME`. Expiry is checked
//! lazily on lookup. When the table is full, the least recently updated
//! entry makes room.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aodv_core::{Clock, MetricType, NodeAddress, PacketData, SeqNum};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::AodvConfig;

/// Best route request seen for an (origin, target) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RreqEntry {
    /// Node that originated the discovery
    pub origin: NodeAddress,
    /// Node being searched for
    pub target: NodeAddress,
    /// Metric type of `metric`
    pub metric_type: MetricType,
    /// Lowest metric to the origin seen
    pub metric: u8,
    /// Freshest origin sequence number seen
    pub seq_num: SeqNum,
    /// When a request for the pair was last accepted
    pub timestamp: Instant,
}

impl RreqEntry {
    /// Entry for a request accepted at `now`
    fn accepted(packet: &PacketData, now: Instant) -> Self {
        Self {
            origin: packet.orig_node.addr,
            target: packet.targ_node.addr,
            metric_type: packet.metric_type,
            metric: packet.orig_node.metric,
            seq_num: packet.orig_node.seq_num,
            timestamp: now,
        }
    }
}

/// Bounded cache of recent route requests
pub struct RreqTable {
    entries: RwLock<HashMap<(NodeAddress, NodeAddress), RreqEntry>>,
    capacity: usize,
    max_idletime: Duration,
    clock: Arc<dyn Clock>,
}

impl RreqTable {
    /// Create a route request table sized and timed by `config`
    pub fn new(config: &AodvConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(config.rreq_buffer, config.max_idletime, clock)
    }

    /// Create a route request table with explicit limits
    pub fn with_limits(capacity: usize, max_idletime: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            capacity,
            max_idletime,
            clock,
        }
    }

    fn is_expired(&self, entry: &RreqEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) > self.max_idletime
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Check whether a route request is redundant, remembering it if not
    ///
    /// A request is redundant when a stored request for the same
    /// (origin, target) has a sequence number at least as fresh and a metric
    /// at least as low. Otherwise `false` is returned and the stored entry
    /// improves: a fresher sequence number replaces sequence number and
    /// metric, an equal one with a lower metric replaces the metric. A
    /// cheaper request with an older sequence number is not redundant but
    /// leaves the entry alone, so the stored sequence number never moves
    /// backwards. A stored request under a different metric type is not
    /// comparable and is replaced.
    pub fn is_redundant(&self, packet: &PacketData) -> bool {
        let now = self.clock.now();
        let key = packet.discovery_key();
        let mut entries = self.entries.write();

        if entries
            .get(&key)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            entries.remove(&key);
            trace!(origin = %key.0, target = %key.1, "Expired route request forgotten");
        }

        if let Some(stored) = entries.get_mut(&key) {
            if stored.metric_type != packet.metric_type {
                *stored = RreqEntry::accepted(packet, now);
                debug!(origin = %key.0, target = %key.1, "Route request under new metric type");
                return false;
            }

            let seq_num = packet.orig_node.seq_num;
            let metric = packet.orig_node.metric;
            if seq_num.is_fresher_than(stored.seq_num) {
                stored.seq_num = seq_num;
                stored.metric = metric;
                stored.timestamp = now;
            } else if metric < stored.metric {
                if seq_num == stored.seq_num {
                    stored.metric = metric;
                    stored.timestamp = now;
                } else {
                    trace!(
                        origin = %key.0,
                        target = %key.1,
                        seq_num = %seq_num,
                        stored_seq_num = %stored.seq_num,
                        "Cheaper route request with older sequence number"
                    );
                    return false;
                }
            } else {
                trace!(
                    origin = %key.0,
                    target = %key.1,
                    seq_num = %seq_num,
                    metric,
                    "Redundant route request"
                );
                return true;
            }

            debug!(
                origin = %key.0,
                target = %key.1,
                seq_num = %stored.seq_num,
                metric = stored.metric,
                "Route request improves on stored one"
            );
            return false;
        }

        if entries.len() >= self.capacity {
            entries.retain(|_, entry| !self.is_expired(entry, now));
        }
        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(key, _)| *key);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!(origin = %oldest.0, target = %oldest.1, "Evicted oldest route request");
            }
        }

        entries.insert(key, RreqEntry::accepted(packet, now));
        debug!(origin = %key.0, target = %key.1, "New route request");
        false
    }

    /// Get the stored request for an (origin, target) pair
    pub fn get(&self, origin: &NodeAddress, target: &NodeAddress) -> Option<RreqEntry> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(&(*origin, *target))
            .filter(|entry| !self.is_expired(entry, now))
            .copied()
    }

    /// Get the number of stored requests, including expired ones not yet reclaimed
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
