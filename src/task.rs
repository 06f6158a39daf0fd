//! ComponentProxy: local handle on a remote task context
//!
//! A proxy is built by resolving a task name against a transport. Resolution
//! fetches the four sub-interfaces of the task once and caches them for the
//! proxy's lifetime; everything else (state, ports, attributes, connection
//! status) is queried from the remote side on every call.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use taskctx_transport::{
    AttributesInterface, CommandsInterface, MethodsInterface, PortsInterface, RemoteTask,
    SubInterface, TransportAdapter, TransportResult,
};
use tracing::{debug, info, warn};

use crate::attribute::{AttributeOrigin, AttributeProxy};
use crate::error::{LookupExt, PresenceExt, ProxyError, Result};
use crate::port::PortProxy;
use crate::state::ExecutionState;

/// Remote handles owned by a resolved task context
///
/// Either all five handles exist or the value was never built.
pub(crate) struct TaskHandles {
    task: Box<dyn RemoteTask>,
    ports: Box<dyn PortsInterface>,
    attributes: Box<dyn AttributesInterface>,
    methods: Box<dyn MethodsInterface>,
    commands: Box<dyn CommandsInterface>,
}

impl TaskHandles {
    /// Fetch all sub-interfaces of `task`, consuming it
    ///
    /// On failure `task` is dropped here, releasing the root reference.
    fn fetch(name: &str, task: Box<dyn RemoteTask>) -> Result<Self> {
        let not_found = || ProxyError::TaskNotFound(name.to_string());

        let ports = fetch_sub_interface(name, SubInterface::Ports, || task.ports())
            .or_not_found(not_found)?;
        let attributes = fetch_sub_interface(name, SubInterface::Attributes, || task.attributes())
            .or_not_found(not_found)?;
        let methods = fetch_sub_interface(name, SubInterface::Methods, || task.methods())
            .or_not_found(not_found)?;
        let commands = fetch_sub_interface(name, SubInterface::Commands, || task.commands())
            .or_not_found(not_found)?;

        Ok(Self {
            task,
            ports,
            attributes,
            methods,
            commands,
        })
    }

    pub(crate) fn ports(&self) -> &dyn PortsInterface {
        self.ports.as_ref()
    }
}

fn fetch_sub_interface<T>(
    name: &str,
    kind: SubInterface,
    fetch: impl FnOnce() -> TransportResult<T>,
) -> TransportResult<T> {
    debug!("Fetching {} interface of task {}", kind, name);
    fetch().inspect_err(|e| {
        warn!(
            "Failed to fetch {} interface of task {}, releasing it: {}",
            kind, name, e
        );
    })
}

/// Proxy on a remote task context
///
/// Cloning is cheap: clones share the same remote handles, which are released
/// when the last clone is dropped.
///
/// # Example
///
/// ```rust
/// use taskctx::transport::memory::{InMemoryTransport, TaskModel};
/// use taskctx::{ComponentProxy, ExecutionState};
/// use taskctx_transport::PortType;
///
/// # fn main() -> taskctx::Result<()> {
/// let transport = InMemoryTransport::new();
/// transport.add_task(TaskModel::new("ctrl").with_port("cmd", PortType::Input, "double"));
///
/// let task = ComponentProxy::get(&transport, "ctrl")?;
/// assert_eq!(task.state()?, ExecutionState::PreOperational);
///
/// let port = task.port("cmd")?;
/// assert!(port.is_input());
/// assert_eq!(port.type_name(), "double");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ComponentProxy {
    name: String,
    handles: Arc<TaskHandles>,
}

impl ComponentProxy {
    /// Resolve the task context registered as `name`
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::TaskNotFound` if the name is unknown or one of
    /// the task's sub-interfaces cannot be resolved. Connectivity failures
    /// are returned as `ProxyError::Transport`.
    pub fn get<T>(transport: &T, name: &str) -> Result<Self>
    where
        T: TransportAdapter + ?Sized,
    {
        debug!("Resolving task context: {}", name);

        let task = transport
            .resolve_by_name(name)
            .or_not_found(|| ProxyError::TaskNotFound(name.to_string()))?;
        let handles = TaskHandles::fetch(name, task)?;

        info!("Resolved task context: {}", name);

        Ok(Self {
            name: name.to_string(),
            handles: Arc::new(handles),
        })
    }

    /// The name this proxy was resolved with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote identity comparison for callers holding type-erased values
    ///
    /// Returns false when `other` is not a `ComponentProxy`.
    pub fn equals(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<ComponentProxy>()
            .is_some_and(|other| self.is_same_remote(other))
    }

    fn is_same_remote(&self, other: &ComponentProxy) -> bool {
        Arc::ptr_eq(&self.handles, &other.handles)
            || self.handles.task.is_equivalent(other.handles.task.as_ref())
    }

    /// Current execution state, queried from the remote task
    ///
    /// # Errors
    ///
    /// A raw state outside the known set is reported as a malformed
    /// transport response.
    pub fn state(&self) -> Result<ExecutionState> {
        let raw = self.raw_state()?;
        Ok(ExecutionState::try_from(raw)?)
    }

    /// Current execution state as reported on the wire
    pub fn raw_state(&self) -> Result<i32> {
        debug!("Querying execution state of {}", self.name);
        Ok(self.handles.task.execution_state()?)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Ports
    // ═══════════════════════════════════════════════════════════════════════

    /// Look up the port `name`
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::PortNotFound` if the task has no such port.
    pub fn port(&self, name: &str) -> Result<PortProxy<'_>> {
        let not_found = || ProxyError::PortNotFound {
            task: self.name.clone(),
            port: name.to_string(),
        };

        debug!("Looking up port {}.{}", self.name, name);

        let ports = self.handles.ports();
        let direction = ports.port_type(name).or_not_found(not_found)?;
        let type_name = ports.data_type(name).or_not_found(not_found)?;

        Ok(PortProxy::new(self, name, direction, type_name))
    }

    /// Names of all ports, in the order the task reports them
    pub fn port_names(&self) -> Result<Vec<String>> {
        Ok(self.handles.ports().port_names()?)
    }

    /// Call `visit` with every port of the task, in reported order
    ///
    /// Each port is looked up as by [`ComponentProxy::port`]; the first
    /// failing lookup aborts the enumeration.
    pub fn each_port<'a, F>(&'a self, mut visit: F) -> Result<()>
    where
        F: FnMut(PortProxy<'a>),
    {
        for name in self.port_names()? {
            visit(self.port(&name)?);
        }
        Ok(())
    }

    pub fn ports(&self) -> Result<Vec<PortProxy<'_>>> {
        let mut ports = Vec::new();
        self.each_port(|port| ports.push(port))?;
        Ok(ports)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Attributes and properties
    // ═══════════════════════════════════════════════════════════════════════

    /// Look up the property or attribute `name`
    ///
    /// Properties shadow attributes: the attribute table is only consulted
    /// when no property of that name exists.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::AttributeNotFound` if neither table has `name`.
    pub fn attribute(&self, name: &str) -> Result<AttributeProxy<'_>> {
        let not_found = || ProxyError::AttributeNotFound {
            task: self.name.clone(),
            name: name.to_string(),
        };

        debug!("Looking up attribute {}.{}", self.name, name);

        let table = self.handles.attributes.as_ref();
        let property = match table.property(name) {
            Err(e) if e.is_unresolved() => None,
            other => other?,
        };

        let (origin, expression) = match property {
            Some(expression) => (AttributeOrigin::Property, expression),
            None => (
                AttributeOrigin::Attribute,
                table.attribute(name).present_or_not_found(not_found)?,
            ),
        };

        let type_name = expression.type_name().or_not_found(not_found)?;

        Ok(AttributeProxy::new(self, name, origin, type_name, expression))
    }

    pub fn attribute_names(&self) -> Result<Vec<String>> {
        Ok(self.handles.attributes.attribute_names()?)
    }

    pub fn property_names(&self) -> Result<Vec<String>> {
        Ok(self.handles.attributes.property_names()?)
    }

    /// Call `visit` for every attribute name, then for every property name
    ///
    /// Each name goes through [`ComponentProxy::attribute`], so a name that
    /// is both an attribute and a property is visited twice and resolves to
    /// the property both times.
    pub fn each_attribute<'a, F>(&'a self, mut visit: F) -> Result<()>
    where
        F: FnMut(AttributeProxy<'a>),
    {
        for name in self.attribute_names()? {
            visit(self.attribute(&name)?);
        }
        for name in self.property_names()? {
            visit(self.attribute(&name)?);
        }
        Ok(())
    }

    pub fn attributes(&self) -> Result<Vec<AttributeProxy<'_>>> {
        let mut attributes = Vec::new();
        self.each_attribute(|attribute| attributes.push(attribute))?;
        Ok(attributes)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Methods and commands
    // ═══════════════════════════════════════════════════════════════════════

    pub fn method_names(&self) -> Result<Vec<String>> {
        Ok(self.handles.methods.method_names()?)
    }

    pub fn command_names(&self) -> Result<Vec<String>> {
        Ok(self.handles.commands.command_names()?)
    }

    pub(crate) fn handles(&self) -> &Arc<TaskHandles> {
        &self.handles
    }
}

impl PartialEq for ComponentProxy {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_remote(other)
    }
}

impl fmt::Debug for ComponentProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentProxy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ComponentProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
