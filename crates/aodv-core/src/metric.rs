//! Route metrics
//!
//! A metric type names the cost function a route's metric is expressed in.
//! Routes under different metric types are never compared with each other.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Identifier of a route cost function
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MetricType(pub u8);

impl MetricType {
    /// Hop count, the default AODVv2 metric
    pub const HOP_COUNT: MetricType = MetricType(3);

    /// Get the raw identifier
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Cost of traversing a single link under this metric
    pub fn link_cost(&self) -> u8 {
        1
    }
}

impl Default for MetricType {
    fn default() -> Self {
        Self::HOP_COUNT
    }
}

impl Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::HOP_COUNT => write!(f, "hop-count"),
            MetricType(other) => write!(f, "metric-{}", other),
        }
    }
}

/// Largest metric value; adding link costs saturates here
pub const MAX_METRIC: u8 = u8::MAX;

/// Add the cost of one more link to a metric value
pub fn add_link_cost(metric: u8, metric_type: MetricType) -> u8 {
    metric.saturating_add(metric_type.link_cost())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hop_count() {
        assert_eq!(MetricType::default(), MetricType::HOP_COUNT);
        assert_eq!(MetricType::HOP_COUNT.value(), 3);
        assert_eq!(MetricType::HOP_COUNT.to_string(), "hop-count");
        assert_eq!(MetricType(7).to_string(), "metric-7");
    }

    #[test]
    fn test_add_link_cost_saturates() {
        assert_eq!(add_link_cost(0, MetricType::HOP_COUNT), 1);
        assert_eq!(add_link_cost(MAX_METRIC, MetricType::HOP_COUNT), MAX_METRIC);
    }
}
