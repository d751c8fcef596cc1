//! Configuration for the routing core

use std::time::Duration;

use aodv_core::MetricType;
use aodv_core::constants::{
    ACTIVE_INTERVAL, DISCOVERY_ATTEMPTS_MAX, MANET_PORT, MAX_CLIENTS, MAX_HOPCOUNT, MAX_IDLETIME,
    MAX_ROUTING_ENTRIES, RREQ_BUF, RREQ_WAIT_TIME,
};
use serde::{Deserialize, Serialize};

/// Configuration for an [`AodvNode`](crate::AodvNode)
///
/// Every field defaults to the protocol constant of the same name, so a
/// partial document only needs to list what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AodvConfig {
    /// UDP port control messages are exchanged on
    pub port: u16,
    /// Metric type used for route selection
    ///
    /// Nodes accept only [`MetricType::HOP_COUNT`]; other values are rejected
    /// by [`AodvNode::with_clock`](crate::AodvNode::with_clock).
    pub metric_type: MetricType,
    /// Time after which an unused route is idle
    pub active_interval: Duration,
    /// Time an idle route or a remembered route request stays valid
    pub max_idletime: Duration,
    /// Hop limit for originated control messages
    pub max_hopcount: u8,
    /// Client table capacity
    pub max_clients: usize,
    /// Routing table capacity
    pub max_routing_entries: usize,
    /// Route request table capacity
    pub rreq_buffer: usize,
    /// Route discovery attempts before giving up
    pub discovery_attempts_max: u32,
    /// Wait between route discovery attempts
    pub rreq_wait_time: Duration,
}

impl Default for AodvConfig {
    fn default() -> Self {
        Self {
            port: MANET_PORT,
            metric_type: MetricType::HOP_COUNT,
            active_interval: ACTIVE_INTERVAL,
            max_idletime: MAX_IDLETIME,
            max_hopcount: MAX_HOPCOUNT,
            max_clients: MAX_CLIENTS,
            max_routing_entries: MAX_ROUTING_ENTRIES,
            rreq_buffer: RREQ_BUF,
            discovery_attempts_max: DISCOVERY_ATTEMPTS_MAX,
            rreq_wait_time: RREQ_WAIT_TIME,
        }
    }
}

impl AodvConfig {
    /// Total time a route survives without use
    pub fn route_lifetime(&self) -> Duration {
        self.active_interval + self.max_idletime
    }

    /// Set the active metric type
    pub fn with_metric_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    /// Set the route aging intervals
    pub fn with_timeouts(mut self, active_interval: Duration, max_idletime: Duration) -> Self {
        self.active_interval = active_interval;
        self.max_idletime = max_idletime;
        self
    }

    /// Set the hop limit for originated messages
    pub fn with_max_hopcount(mut self, max_hopcount: u8) -> Self {
        self.max_hopcount = max_hopcount;
        self
    }

    /// Set the capacities of the client, routing and route request tables
    pub fn with_capacities(mut self, clients: usize, routes: usize, rreqs: usize) -> Self {
        self.max_clients = clients;
        self.max_routing_entries = routes;
        self.rreq_buffer = rreqs;
        self
    }

    /// Set the route discovery retry policy
    pub fn with_discovery(mut self, attempts: u32, wait_time: Duration) -> Self {
        self.discovery_attempts_max = attempts;
        self.rreq_wait_time = wait_time;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AodvConfig::default();
        assert_eq!(config.port, 269);
        assert_eq!(config.metric_type, MetricType::HOP_COUNT);
        assert_eq!(config.max_clients, 16);
        assert_eq!(config.rreq_buffer, 3);
        assert_eq!(config.route_lifetime(), Duration::from_secs(255));
    }

    #[test]
    fn test_builder() {
        let config = AodvConfig::default()
            .with_timeouts(Duration::from_secs(1), Duration::from_secs(2))
            .with_capacities(4, 8, 2)
            .with_discovery(5, Duration::from_millis(10))
            .with_max_hopcount(3);

        assert_eq!(config.route_lifetime(), Duration::from_secs(3));
        assert_eq!(config.max_routing_entries, 8);
        assert_eq!(config.discovery_attempts_max, 5);
        assert_eq!(config.max_hopcount, 3);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: AodvConfig = serde_json::from_str(r#"{"max_hopcount": 7}"#).unwrap();
        assert_eq!(config.max_hopcount, 7);
        assert_eq!(config.port, 269);
        assert_eq!(config.max_idletime, MAX_IDLETIME);
    }
}
