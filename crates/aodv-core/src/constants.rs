//! AODVv2 protocol constants
//!
//! Values follow draft-ietf-manet-aodvv2 as deployed on the constrained
//! targets this core was written for. Runtime overrides live in the
//! routing crate's configuration.

use std::time::Duration;

/// UDP port for MANET control traffic (RFC 5498)
pub const MANET_PORT: u16 = 269;

/// Time after which an unused route becomes idle
pub const ACTIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Time an idle route (or a remembered route request) stays usable
pub const MAX_IDLETIME: Duration = Duration::from_secs(250);

/// Lifetime of a remembered sequence number
pub const MAX_SEQNUM_LIFETIME: Duration = Duration::from_secs(300);

/// Hop limit for originated control messages
pub const MAX_HOPCOUNT: u8 = 20;

/// Prefix length of host routes
pub const HOST_PREFIX_LENGTH: u8 = 128;

/// Number of addresses the client table can hold
pub const MAX_CLIENTS: usize = 16;

/// Number of routes the routing table can hold
pub const MAX_ROUTING_ENTRIES: usize = 255;

/// Number of route requests remembered for duplicate suppression
pub const RREQ_BUF: usize = 3;

/// Route discovery attempts before giving up on a destination
pub const DISCOVERY_ATTEMPTS_MAX: u32 = 3;

/// Time to wait for a route reply before retrying discovery
pub const RREQ_WAIT_TIME: Duration = Duration::from_secs(2);

/// RFC5444 message types
pub mod msg_type {
    pub const RREQ: u8 = 10;
    pub const RREP: u8 = 11;
    pub const RERR: u8 = 12;
}

/// RFC5444 address TLV types
pub mod tlv_type {
    pub const ORIG_SEQNUM: u8 = 0;
    pub const TARG_SEQNUM: u8 = 1;
    pub const UNREACHABLE_NODE_SEQNUM: u8 = 2;
    pub const METRIC: u8 = 3;
}
