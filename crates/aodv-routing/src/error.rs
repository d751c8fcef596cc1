//! Routing error types
//!
//! Re-exports core errors and adds routing-specific errors.

use std::fmt::{self, Display};

use aodv_core::{MetricType, NodeAddress};
use thiserror::Error;

// Re-export core errors
pub use aodv_core::CoreError;

/// Bounded table that rejected an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Client,
    Routing,
    RouteRequest,
}

impl Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Client => write!(f, "client table"),
            TableKind::Routing => write!(f, "routing table"),
            TableKind::RouteRequest => write!(f, "route request table"),
        }
    }
}

/// Errors for the routing crate
///
/// Failing to find a route is not an error; see
/// [`RouteDecision::NoRoute`](crate::RouteDecision::NoRoute).
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// A bounded table is full
    #[error("{table} full (capacity: {capacity})")]
    CapacityExceeded { table: TableKind, capacity: usize },

    /// Destination can never have a route (multicast or unspecified)
    #[error("Invalid destination: {0}")]
    InvalidDestination(NodeAddress),

    /// Only hop count has a link cost defined
    #[error("Unsupported metric type: {0}")]
    UnsupportedMetricType(MetricType),

    /// Route discovery gave up
    #[error("No route to {destination} after {attempts} discovery attempts")]
    DiscoveryFailed {
        destination: NodeAddress,
        attempts: u32,
    },
}

/// Result type for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;
