//! Node addressing
//!
//! AODVv2 nodes are addressed by IPv6 address. [`NodeAddress`] wraps
//! [`Ipv6Addr`] so the routing tables can key on a small `Copy` value and
//! so destination validity has a single home.

use std::fmt::{self, Display};
use std::net::Ipv6Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Address of a mesh node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeAddress(Ipv6Addr);

impl NodeAddress {
    /// Wrap an IPv6 address
    pub const fn new(addr: Ipv6Addr) -> Self {
        Self(addr)
    }

    /// The link-local all-nodes multicast address (`ff02::1`)
    ///
    /// Route requests and route errors are flooded to this address.
    pub const fn all_nodes_multicast() -> Self {
        Self(Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1))
    }

    /// The unspecified address (`::`)
    pub const fn unspecified() -> Self {
        Self(Ipv6Addr::UNSPECIFIED)
    }

    /// Get the underlying IPv6 address
    pub const fn ip(&self) -> Ipv6Addr {
        self.0
    }

    /// Check if this is a multicast address
    pub fn is_multicast(&self) -> bool {
        self.0.is_multicast()
    }

    /// Check if this is the unspecified address
    pub fn is_unspecified(&self) -> bool {
        self.0.is_unspecified()
    }

    /// Check if packets can be routed to this address
    ///
    /// Multicast groups and the unspecified address never get a routing
    /// table entry.
    pub fn is_routable(&self) -> bool {
        !self.is_multicast() && !self.is_unspecified()
    }
}

impl Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv6Addr>()
            .map(Self)
            .map_err(|_| CoreError::InvalidAddress(s.to_string()))
    }
}

impl From<Ipv6Addr> for NodeAddress {
    fn from(addr: Ipv6Addr) -> Self {
        Self(addr)
    }
}

impl From<NodeAddress> for Ipv6Addr {
    fn from(addr: NodeAddress) -> Self {
        addr.0
    }
}
