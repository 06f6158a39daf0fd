//! Port proxies
//!
//! A `PortProxy` borrows the `ComponentProxy` it was looked up on, so it can
//! never outlive its task. Host adapters that cannot carry a Rust lifetime
//! use [`PortProxy::detach`] instead, which trades the compile-time guarantee
//! for a runtime check.

use std::fmt;
use std::sync::{Arc, Weak};

use taskctx_transport::PortType;
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::task::{ComponentProxy, TaskHandles};

/// Description of one remote port
#[derive(Debug, Clone)]
pub struct PortInfo<'a> {
    name: String,
    type_name: String,
    owner: &'a ComponentProxy,
}

impl<'a> PortInfo<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn owner(&self) -> &'a ComponentProxy {
        self.owner
    }
}

/// A data port of a remote task, tagged by direction
#[derive(Debug, Clone)]
pub enum PortProxy<'a> {
    Input(PortInfo<'a>),
    Output(PortInfo<'a>),
}

impl<'a> PortProxy<'a> {
    pub(crate) fn new(
        owner: &'a ComponentProxy,
        name: &str,
        direction: PortType,
        type_name: String,
    ) -> Self {
        let info = PortInfo {
            name: name.to_string(),
            type_name,
            owner,
        };
        match direction {
            PortType::Input => PortProxy::Input(info),
            PortType::Output => PortProxy::Output(info),
        }
    }

    fn info(&self) -> &PortInfo<'a> {
        match self {
            PortProxy::Input(info) | PortProxy::Output(info) => info,
        }
    }

    pub fn name(&self) -> &str {
        self.info().name()
    }

    /// Name of the type of the samples this port carries
    pub fn type_name(&self) -> &str {
        self.info().type_name()
    }

    pub fn direction(&self) -> PortType {
        match self {
            PortProxy::Input(_) => PortType::Input,
            PortProxy::Output(_) => PortType::Output,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, PortProxy::Input(_))
    }

    pub fn is_output(&self) -> bool {
        matches!(self, PortProxy::Output(_))
    }

    /// The task this port belongs to
    pub fn owner(&self) -> &'a ComponentProxy {
        self.info().owner()
    }

    /// Whether the port is currently part of a connection
    pub fn is_connected(&self) -> Result<bool> {
        let owner = self.owner();
        debug!("Querying connection status of {}.{}", owner.name(), self.name());
        Ok(owner.handles().ports().is_connected(self.name())?)
    }

    /// A handle on this port that does not borrow the owning task
    pub fn detach(&self) -> PortHandle {
        PortHandle {
            task: self.owner().name().to_string(),
            name: self.name().to_string(),
            type_name: self.type_name().to_string(),
            direction: self.direction(),
            owner: Arc::downgrade(self.owner().handles()),
        }
    }
}

impl PartialEq for PortProxy<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.direction() == other.direction()
            && self.name() == other.name()
            && self.type_name() == other.type_name()
            && self.owner() == other.owner()
    }
}

impl fmt::Display for PortProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner().name(), self.name())
    }
}

/// A port detached from the lifetime of its task
///
/// Holds a weak reference on the task's remote handles: it stays usable as
/// long as at least one clone of the owning `ComponentProxy` is alive.
#[derive(Clone)]
pub struct PortHandle {
    task: String,
    name: String,
    type_name: String,
    direction: PortType,
    owner: Weak<TaskHandles>,
}

impl PortHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_name(&self) -> &str {
        &self.task
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn direction(&self) -> PortType {
        self.direction
    }

    /// Whether the owning task proxy is still alive
    pub fn is_attached(&self) -> bool {
        self.owner.strong_count() > 0
    }

    /// # Errors
    ///
    /// Returns `ProxyError::Usage` once every clone of the owning
    /// `ComponentProxy` has been dropped.
    pub fn is_connected(&self) -> Result<bool> {
        let handles = self.owner.upgrade().ok_or_else(|| {
            ProxyError::Usage(format!(
                "port {}.{} used after task context '{}' was released",
                self.task, self.name, self.task
            ))
        })?;
        debug!("Querying connection status of {}.{}", self.task, self.name);
        Ok(handles.ports().is_connected(&self.name)?)
    }
}

impl fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortHandle")
            .field("task", &self.task)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("direction", &self.direction)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl fmt::Display for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.task, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::memory::{InMemoryTransport, TaskModel};

    fn transport() -> InMemoryTransport {
        let transport = InMemoryTransport::new();
        transport.add_task(
            TaskModel::new("ctrl")
                .with_port("cmd", PortType::Input, "double")
                .with_port("status", PortType::Output, "int"),
        );
        transport
    }

    #[test]
    fn test_is_connected_is_fresh() {
        let transport = transport();
        let task = ComponentProxy::get(&transport, "ctrl").unwrap();
        let port = task.port("cmd").unwrap();

        assert!(!port.is_connected().unwrap());
        transport.set_connected("ctrl", "cmd", true);
        assert!(port.is_connected().unwrap());
    }

    #[test]
    fn test_display() {
        let transport = transport();
        let task = ComponentProxy::get(&transport, "ctrl").unwrap();
        let port = task.port("status").unwrap();
        assert_eq!(port.to_string(), "ctrl.status");
        assert_eq!(port.detach().to_string(), "ctrl.status");
    }

    #[test]
    fn test_lookups_are_independent_values() {
        let transport = transport();
        let task = ComponentProxy::get(&transport, "ctrl").unwrap();
        let first = task.port("cmd").unwrap();
        let second = task.port("cmd").unwrap();
        assert_eq!(first, second);
        assert_ne!(first, task.port("status").unwrap());
    }

    #[test]
    fn test_detached_handle_follows_owner() {
        let transport = transport();
        let task = ComponentProxy::get(&transport, "ctrl").unwrap();
        let handle = task.port("cmd").unwrap().detach();

        assert!(handle.is_attached());
        assert_eq!(handle.direction(), PortType::Input);
        assert_eq!(handle.task_name(), "ctrl");
        transport.set_connected("ctrl", "cmd", true);
        assert!(handle.is_connected().unwrap());

        drop(task);
        assert!(!handle.is_attached());
        let err = handle.is_connected().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.to_string().contains("ctrl.cmd"));
    }

    #[test]
    fn test_detached_handle_survives_while_a_clone_lives() {
        let transport = transport();
        let task = ComponentProxy::get(&transport, "ctrl").unwrap();
        let clone = task.clone();
        let handle = task.port("status").unwrap().detach();

        drop(task);
        assert!(handle.is_connected().is_ok());
        drop(clone);
        assert!(handle.is_connected().is_err());
    }
}
