//! Node context injection for multi-node logging
//!
//! Several nodes often run in one process (simulations, tests). This module
//! keeps the node a thread is currently working for in thread-local storage
//! so every span opened in that scope can be attributed to it.

use std::cell::RefCell;

use aodv_core::NodeAddress;
use uuid::Uuid;

/// Node context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContextData {
    /// Address of the node
    pub node_address: NodeAddress,
    /// Unique instance ID for this node session
    pub instance_id: Uuid,
}

thread_local! {
    static NODE_CONTEXT: RefCell<Option<NodeContextData>> = const { RefCell::new(None) };
}

/// RAII guard for node context
///
/// Creating the guard sets the node context for the current thread.
/// Dropping it restores the previous context (if any).
///
/// # Example
///
/// ```ignore
/// use aodv_logging::context::NodeContextGuard;
///
/// let _guard = NodeContextGuard::new(&node.address());
///
/// // Spans opened in this scope carry the node's address
/// node.on_route_request(packet)?;
/// ```
pub struct NodeContextGuard {
    previous: Option<NodeContextData>,
}

impl NodeContextGuard {
    /// Set the node context with a fresh instance ID
    pub fn new(address: &NodeAddress) -> Self {
        Self::with_instance_id(address, Uuid::new_v4())
    }

    /// Set the node context with a specific instance ID
    ///
    /// Useful to keep one instance ID across several scopes of the same node.
    pub fn with_instance_id(address: &NodeAddress, instance_id: Uuid) -> Self {
        let new_ctx = NodeContextData {
            node_address: *address,
            instance_id,
        };
        let previous = NODE_CONTEXT.with(|ctx| ctx.borrow_mut().replace(new_ctx));
        Self { previous }
    }

    /// Get the current node context (if any)
    pub fn current() -> Option<NodeContextData> {
        NODE_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current node address (if set)
    pub fn current_address() -> Option<NodeAddress> {
        Self::current().map(|ctx| ctx.node_address)
    }

    /// Get the current instance ID (if set)
    pub fn current_instance_id() -> Option<Uuid> {
        Self::current().map(|ctx| ctx.instance_id)
    }
}

impl Drop for NodeContextGuard {
    fn drop(&mut self) {
        NODE_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Convenience macro to run a block in a node context
///
/// # Example
///
/// ```ignore
/// with_node_context!(&node.address(), {
///     node.on_route_reply(packet)?;
/// });
/// ```
#[macro_export]
macro_rules! with_node_context {
    ($address:expr, $body:block) => {{
        let _guard = $crate::context::NodeContextGuard::new($address);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> NodeAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_node_context_guard() {
        assert!(NodeContextGuard::current().is_none());

        {
            let _guard = NodeContextGuard::new(&addr("::1"));
            assert_eq!(NodeContextGuard::current_address(), Some(addr("::1")));
            assert!(NodeContextGuard::current_instance_id().is_some());
        }

        assert!(NodeContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        {
            let _guard_a = NodeContextGuard::new(&addr("::1"));
            {
                let _guard_b = NodeContextGuard::new(&addr("::2"));
                assert_eq!(NodeContextGuard::current_address(), Some(addr("::2")));
            }
            // Restored after the inner guard drops
            assert_eq!(NodeContextGuard::current_address(), Some(addr("::1")));
        }

        assert!(NodeContextGuard::current_address().is_none());
    }

    #[test]
    fn test_with_instance_id() {
        let instance_id = Uuid::new_v4();
        let _guard = NodeContextGuard::with_instance_id(&addr("::7"), instance_id);
        assert_eq!(NodeContextGuard::current_instance_id(), Some(instance_id));
    }

    #[test]
    fn test_macro_scopes_context() {
        let seen = crate::with_node_context!(&addr("::9"), { NodeContextGuard::current_address() });
        assert_eq!(seen, Some(addr("::9")));
        assert!(NodeContextGuard::current().is_none());
    }
}
