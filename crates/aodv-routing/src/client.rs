//! Client table
//!
//! The [`ClientTable`] holds the addresses this node originates and
//! terminates traffic for. Packets to a client need no route. Entries are
//! static configuration: they never expire.

use std::collections::HashSet;

use aodv_core::NodeAddress;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{RoutingError, RoutingResult, TableKind};

/// Bounded set of client addresses
pub struct ClientTable {
    clients: RwLock<HashSet<NodeAddress>>,
    capacity: usize,
}

impl ClientTable {
    /// Create an empty client table holding at most `capacity` addresses
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: RwLock::new(HashSet::with_capacity(capacity)),
            capacity,
        }
    }

    /// Remove all clients
    ///
    /// The node's own address has to be added back by the caller.
    pub fn clear(&self) {
        self.clients.write().clear();
    }

    /// Add a client address
    ///
    /// Adding an address that is already present is a no-op.
    pub fn add(&self, addr: NodeAddress) -> RoutingResult<()> {
        let mut clients = self.clients.write();
        if clients.contains(&addr) {
            return Ok(());
        }
        if clients.len() >= self.capacity {
            return Err(RoutingError::CapacityExceeded {
                table: TableKind::Client,
                capacity: self.capacity,
            });
        }
        clients.insert(addr);
        debug!(client = %addr, "Client added");
        Ok(())
    }

    /// Check if an address is a client of this node
    pub fn is_client(&self, addr: &NodeAddress) -> bool {
        self.clients.read().contains(addr)
    }

    /// Remove a client address (no-op if absent)
    pub fn remove(&self, addr: &NodeAddress) {
        if self.clients.write().remove(addr) {
            debug!(client = %addr, "Client removed");
        }
    }

    /// Get the number of clients
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Get all client addresses
    pub fn clients(&self) -> Vec<NodeAddress> {
        self.clients.read().iter().copied().collect()
    }
}
