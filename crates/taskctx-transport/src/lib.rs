//! taskctx Transport: the remote-object contract behind task context proxies
//!
//! This crate defines the traits a remote-object transport must implement so
//! that `taskctx` can resolve task contexts by name and query their ports,
//! attributes, properties and execution state.
//!
//! # Architecture
//!
//! A transport exposes one root service and a tree of remote handles:
//!
//! 1. **TransportAdapter**: name resolution and enumeration of known tasks
//! 2. **RemoteTask**: one resolved task context, with its execution state and
//!    four sub-interfaces
//! 3. **Sub-interfaces**: ports, attributes (and properties), methods, commands
//! 4. **Expression**: a remote attribute or property value handle
//!
//! Every call is synchronous: it blocks until the remote side answers or the
//! transport gives up.
//!
//! # Example
//!
//! ```rust
//! use taskctx_transport::{TransportAdapter, TransportResult};
//!
//! fn first_task<T: TransportAdapter>(transport: &T) -> TransportResult<Option<String>> {
//!     Ok(transport.list_known_names()?.into_iter().next())
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by a transport implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("no object registered under '{0}'")]
    NoSuchName(String),

    #[error("no such port: {0}")]
    NoSuchPort(String),

    #[error("nil object reference returned for {0}")]
    NilReference(String),

    #[error("remote endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("remote fault: {0}")]
    RemoteFault(String),
}

impl TransportError {
    /// Whether this failure means "the requested object does not exist"
    ///
    /// Only these failures may be reported to callers as a missing task,
    /// port or attribute. Everything else is a transport fault.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            TransportError::NoSuchName(_)
                | TransportError::NoSuchPort(_)
                | TransportError::NilReference(_)
        )
    }

    /// Whether the remote side could not be reached at all
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            TransportError::Unreachable(_) | TransportError::Timeout(_)
        )
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Direction of a data port as reported by the remote task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    Input,
    Output,
}

impl PortType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortType::Input => "input",
            PortType::Output => "output",
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four sub-interfaces every remote task exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubInterface {
    Ports,
    Attributes,
    Methods,
    Commands,
}

impl SubInterface {
    pub const ALL: [SubInterface; 4] = [
        SubInterface::Ports,
        SubInterface::Attributes,
        SubInterface::Methods,
        SubInterface::Commands,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubInterface::Ports => "ports",
            SubInterface::Attributes => "attributes",
            SubInterface::Methods => "methods",
            SubInterface::Commands => "commands",
        }
    }
}

impl fmt::Display for SubInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point of a transport: name resolution against the naming service
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so that proxies built on top of them
/// can be moved across threads. The proxies themselves add no locking.
pub trait TransportAdapter: Send + Sync {
    /// Resolve a task context by its registered name
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NoSuchName` if nothing is registered under
    /// `name`, or a connectivity error if the naming service is unreachable.
    fn resolve_by_name(&self, name: &str) -> TransportResult<Box<dyn RemoteTask>>;

    /// Names of all task contexts currently advertised by the naming service
    fn list_known_names(&self) -> TransportResult<Vec<String>>;
}

/// A resolved remote task context
///
/// Dropping the box releases the remote reference.
pub trait RemoteTask: Send + Sync {
    fn ports(&self) -> TransportResult<Box<dyn PortsInterface>>;

    fn attributes(&self) -> TransportResult<Box<dyn AttributesInterface>>;

    fn methods(&self) -> TransportResult<Box<dyn MethodsInterface>>;

    fn commands(&self) -> TransportResult<Box<dyn CommandsInterface>>;

    /// Current value of the remote execution state machine, unmapped
    fn execution_state(&self) -> TransportResult<i32>;

    /// Remote object identity: true when both handles designate the same
    /// remote task, regardless of how each was obtained
    fn is_equivalent(&self, other: &dyn RemoteTask) -> bool;

    /// Downcasting support for `is_equivalent` implementations
    fn as_any(&self) -> &dyn Any;
}

/// Data flow interface of a remote task
pub trait PortsInterface: Send + Sync {
    /// # Errors
    ///
    /// Returns `TransportError::NoSuchPort` for an unknown port name.
    fn port_type(&self, name: &str) -> TransportResult<PortType>;

    /// Name of the type of the samples carried by the port
    fn data_type(&self, name: &str) -> TransportResult<String>;

    fn port_names(&self) -> TransportResult<Vec<String>>;

    fn is_connected(&self, name: &str) -> TransportResult<bool>;
}

/// Attribute and property tables of a remote task
///
/// Lookups return `Ok(None)` for a nil reference, that is when no entry of
/// that name exists in the table.
pub trait AttributesInterface: Send + Sync {
    fn property(&self, name: &str) -> TransportResult<Option<Box<dyn Expression>>>;

    fn attribute(&self, name: &str) -> TransportResult<Option<Box<dyn Expression>>>;

    fn attribute_names(&self) -> TransportResult<Vec<String>>;

    fn property_names(&self) -> TransportResult<Vec<String>>;
}

pub trait MethodsInterface: Send + Sync {
    fn method_names(&self) -> TransportResult<Vec<String>>;
}

pub trait CommandsInterface: Send + Sync {
    fn command_names(&self) -> TransportResult<Vec<String>>;
}

/// A remote expression: the value handle behind an attribute or property
pub trait Expression: Send + Sync {
    fn type_name(&self) -> TransportResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_classification() {
        assert!(TransportError::NoSuchName("ctrl".into()).is_unresolved());
        assert!(TransportError::NoSuchPort("in1".into()).is_unresolved());
        assert!(TransportError::NilReference("ports".into()).is_unresolved());

        assert!(!TransportError::Unreachable("naming service".into()).is_unresolved());
        assert!(!TransportError::Timeout(Duration::from_millis(50)).is_unresolved());
        assert!(!TransportError::Malformed("bad state".into()).is_unresolved());
        assert!(!TransportError::RemoteFault("segfault".into()).is_unresolved());
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(TransportError::Unreachable("host".into()).is_connectivity());
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_connectivity());
        assert!(!TransportError::NoSuchName("x".into()).is_connectivity());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(PortType::Input.to_string(), "input");
        assert_eq!(PortType::Output.to_string(), "output");
        assert_eq!(SubInterface::Attributes.to_string(), "attributes");
        assert_eq!(SubInterface::ALL.len(), 4);
    }

    #[test]
    fn test_error_messages() {
        let err = TransportError::NoSuchName("nav".to_string());
        assert_eq!(err.to_string(), "no object registered under 'nav'");

        let err = TransportError::Timeout(Duration::from_millis(50));
        assert!(err.to_string().contains("50ms"));
    }
}
