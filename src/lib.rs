/*!
 * taskctx - Task Context proxies for distributed control components
 *
 * A client-side proxy layer over a remote-object transport with:
 * - Discovery of the task contexts advertised by a naming service
 * - Typed proxies for tasks, their input/output ports and their attributes
 * - Property-before-attribute name resolution
 * - A closed execution state enumeration
 * - A "not found" error taxonomy kept apart from transport failures
 *
 * Version: 0.1.0
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod attribute;
pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod registry;
pub mod state;
pub mod task;
pub mod transport;

// Re-export commonly used types
pub use attribute::{AttributeOrigin, AttributeProxy};
pub use config::{LogLevel, ProxyConfig};
pub use error::{ErrorKind, ProxyError, Result};
pub use port::{PortHandle, PortInfo, PortProxy};
pub use registry::{qualified_name, task_names, Registry};
pub use state::{
    ExecutionState, STATE_ACTIVE, STATE_FATAL_ERROR, STATE_PRE_OPERATIONAL, STATE_RUNNING,
    STATE_RUNTIME_ERROR, STATE_RUNTIME_WARNING, STATE_STOPPED,
};
pub use task::ComponentProxy;
pub use transport::{PortType, TransportAdapter, TransportError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
