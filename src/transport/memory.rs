//! In-memory transport for testing
//!
//! This provides an in-process implementation of the transport contract that
//! can be used in unit tests and by host adapters without a running naming
//! service or remote tasks.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use taskctx_transport::{
    AttributesInterface, CommandsInterface, Expression, MethodsInterface, PortType,
    PortsInterface, RemoteTask, SubInterface, TransportAdapter, TransportError, TransportResult,
};

use crate::state::STATE_PRE_OPERATIONAL;

#[derive(Debug, Clone)]
struct PortModel {
    name: String,
    direction: PortType,
    data_type: String,
    connected: bool,
}

/// Description of a task context served by an `InMemoryTransport`
///
/// # Example
///
/// ```rust
/// use taskctx::transport::memory::TaskModel;
/// use taskctx_transport::PortType;
///
/// let model = TaskModel::new("ctrl")
///     .with_port("cmd", PortType::Input, "double")
///     .with_property("gain", "double");
/// assert_eq!(model.name(), "ctrl");
/// ```
#[derive(Debug, Clone)]
pub struct TaskModel {
    name: String,
    state: i32,
    ports: Vec<PortModel>,
    properties: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    methods: Vec<String>,
    commands: Vec<String>,
    nil_interfaces: Vec<SubInterface>,
}

impl TaskModel {
    /// A task with no ports or parameters, in the pre-operational state
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: STATE_PRE_OPERATIONAL,
            ports: Vec::new(),
            properties: Vec::new(),
            attributes: Vec::new(),
            methods: Vec::new(),
            commands: Vec::new(),
            nil_interfaces: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_state(mut self, raw: i32) -> Self {
        self.state = raw;
        self
    }

    pub fn with_port(
        mut self,
        name: impl Into<String>,
        direction: PortType,
        data_type: impl Into<String>,
    ) -> Self {
        self.ports.push(PortModel {
            name: name.into(),
            direction,
            data_type: data_type.into(),
            connected: false,
        });
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push((name.into(), type_name.into()));
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.attributes.push((name.into(), type_name.into()));
        self
    }

    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(name.into());
        self
    }

    pub fn with_command(mut self, name: impl Into<String>) -> Self {
        self.commands.push(name.into());
        self
    }

    /// Make the given sub-interface resolve to a nil reference
    pub fn with_nil_interface(mut self, kind: SubInterface) -> Self {
        self.nil_interfaces.push(kind);
        self
    }

    fn find_port(&self, name: &str) -> TransportResult<&PortModel> {
        self.ports
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| TransportError::NoSuchPort(name.to_string()))
    }
}

#[derive(Debug)]
struct RegisteredTask {
    id: u64,
    model: TaskModel,
}

#[derive(Debug)]
struct World {
    tasks: Vec<RegisteredTask>,
    reachable: bool,
    next_id: u64,
}

#[derive(Debug)]
struct Shared {
    world: RwLock<World>,
    open_handles: AtomicUsize,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, World> {
        self.world.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> TransportResult<RwLockReadGuard<'_, World>> {
        let world = self.read();
        if !world.reachable {
            return Err(TransportError::Unreachable(
                "in-memory transport is offline".to_string(),
            ));
        }
        Ok(world)
    }

    /// Run `f` against the model of task `id`
    fn with_task<T>(
        &self,
        id: u64,
        f: impl FnOnce(&TaskModel) -> TransportResult<T>,
    ) -> TransportResult<T> {
        let world = self.online()?;
        let task = world
            .tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TransportError::RemoteFault(format!("object {} no longer exists", id)))?;
        f(&task.model)
    }
}

/// In-process transport serving a set of `TaskModel`s
///
/// Clones share the same state, so a test can keep one clone to mutate the
/// served tasks while proxies query another.
#[derive(Debug, Clone)]
pub struct InMemoryTransport {
    shared: Arc<Shared>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                world: RwLock::new(World {
                    tasks: Vec::new(),
                    reachable: true,
                    next_id: 1,
                }),
                open_handles: AtomicUsize::new(0),
            }),
        }
    }

    /// Register a task, replacing any task of the same name
    ///
    /// A replaced task gets a new object identity, as a restarted remote
    /// task would.
    pub fn add_task(&self, model: TaskModel) {
        let mut world = self.shared.write();
        let id = world.next_id;
        world.next_id += 1;

        let existing = world.tasks.iter().position(|t| t.model.name == model.name);
        let task = RegisteredTask { id, model };
        match existing {
            Some(index) => world.tasks[index] = task,
            None => world.tasks.push(task),
        }
    }

    /// Unregister a task; returns false if it was not registered
    pub fn remove_task(&self, name: &str) -> bool {
        let mut world = self.shared.write();
        let before = world.tasks.len();
        world.tasks.retain(|t| t.model.name != name);
        world.tasks.len() != before
    }

    /// Set the raw execution state of a task; unknown tasks are ignored
    pub fn set_state(&self, name: &str, raw: i32) {
        let mut world = self.shared.write();
        if let Some(task) = world.tasks.iter_mut().find(|t| t.model.name == name) {
            task.model.state = raw;
        }
    }

    /// Mark a port as connected or not; unknown tasks or ports are ignored
    pub fn set_connected(&self, task: &str, port: &str, connected: bool) {
        let mut world = self.shared.write();
        let port = world
            .tasks
            .iter_mut()
            .find(|t| t.model.name == task)
            .and_then(|t| t.model.ports.iter_mut().find(|p| p.name == port));
        if let Some(port) = port {
            port.connected = connected;
        }
    }

    /// Simulate loss (or recovery) of connectivity to the remote side
    pub fn set_reachable(&self, reachable: bool) {
        self.shared.write().reachable = reachable;
    }

    /// Number of root task handles currently held by callers
    pub fn open_handles(&self) -> usize {
        self.shared.open_handles.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportAdapter for InMemoryTransport {
    fn resolve_by_name(&self, name: &str) -> TransportResult<Box<dyn RemoteTask>> {
        let world = self.shared.online()?;
        let task = world
            .tasks
            .iter()
            .find(|t| t.model.name == name)
            .ok_or_else(|| TransportError::NoSuchName(name.to_string()))?;

        Ok(Box::new(MemoryTask::new(task.id, self.shared.clone())))
    }

    fn list_known_names(&self) -> TransportResult<Vec<String>> {
        let world = self.shared.online()?;
        Ok(world.tasks.iter().map(|t| t.model.name.clone()).collect())
    }
}

/// Root handle on a served task; counted in `open_handles`
struct MemoryTask {
    id: u64,
    shared: Arc<Shared>,
}

impl MemoryTask {
    fn new(id: u64, shared: Arc<Shared>) -> Self {
        shared.open_handles.fetch_add(1, Ordering::SeqCst);
        Self { id, shared }
    }

    fn sub_interface(&self, kind: SubInterface) -> TransportResult<MemoryInterface> {
        self.shared.with_task(self.id, |model| {
            if model.nil_interfaces.contains(&kind) {
                return Err(TransportError::NilReference(format!(
                    "{} interface of {}",
                    kind, model.name
                )));
            }
            Ok(MemoryInterface {
                id: self.id,
                shared: self.shared.clone(),
            })
        })
    }
}

impl Drop for MemoryTask {
    fn drop(&mut self) {
        self.shared.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RemoteTask for MemoryTask {
    fn ports(&self) -> TransportResult<Box<dyn PortsInterface>> {
        Ok(Box::new(self.sub_interface(SubInterface::Ports)?))
    }

    fn attributes(&self) -> TransportResult<Box<dyn AttributesInterface>> {
        Ok(Box::new(self.sub_interface(SubInterface::Attributes)?))
    }

    fn methods(&self) -> TransportResult<Box<dyn MethodsInterface>> {
        Ok(Box::new(self.sub_interface(SubInterface::Methods)?))
    }

    fn commands(&self) -> TransportResult<Box<dyn CommandsInterface>> {
        Ok(Box::new(self.sub_interface(SubInterface::Commands)?))
    }

    fn execution_state(&self) -> TransportResult<i32> {
        self.shared.with_task(self.id, |model| Ok(model.state))
    }

    fn is_equivalent(&self, other: &dyn RemoteTask) -> bool {
        other
            .as_any()
            .downcast_ref::<MemoryTask>()
            .is_some_and(|other| other.id == self.id && Arc::ptr_eq(&other.shared, &self.shared))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Sub-interface handle; one type serves all four interfaces
struct MemoryInterface {
    id: u64,
    shared: Arc<Shared>,
}

impl PortsInterface for MemoryInterface {
    fn port_type(&self, name: &str) -> TransportResult<PortType> {
        self.shared
            .with_task(self.id, |model| Ok(model.find_port(name)?.direction))
    }

    fn data_type(&self, name: &str) -> TransportResult<String> {
        self.shared
            .with_task(self.id, |model| Ok(model.find_port(name)?.data_type.clone()))
    }

    fn port_names(&self) -> TransportResult<Vec<String>> {
        self.shared.with_task(self.id, |model| {
            Ok(model.ports.iter().map(|p| p.name.clone()).collect())
        })
    }

    fn is_connected(&self, name: &str) -> TransportResult<bool> {
        self.shared
            .with_task(self.id, |model| Ok(model.find_port(name)?.connected))
    }
}

fn find_entry(table: &[(String, String)], name: &str) -> Option<Box<dyn Expression>> {
    table.iter().find(|(n, _)| n == name).map(|(_, type_name)| {
        Box::new(MemoryExpression {
            type_name: type_name.clone(),
        }) as Box<dyn Expression>
    })
}

fn names(table: &[(String, String)]) -> Vec<String> {
    table.iter().map(|(n, _)| n.clone()).collect()
}

impl AttributesInterface for MemoryInterface {
    fn property(&self, name: &str) -> TransportResult<Option<Box<dyn Expression>>> {
        self.shared
            .with_task(self.id, |model| Ok(find_entry(&model.properties, name)))
    }

    fn attribute(&self, name: &str) -> TransportResult<Option<Box<dyn Expression>>> {
        self.shared
            .with_task(self.id, |model| Ok(find_entry(&model.attributes, name)))
    }

    fn attribute_names(&self) -> TransportResult<Vec<String>> {
        self.shared.with_task(self.id, |model| Ok(names(&model.attributes)))
    }

    fn property_names(&self) -> TransportResult<Vec<String>> {
        self.shared.with_task(self.id, |model| Ok(names(&model.properties)))
    }
}

impl MethodsInterface for MemoryInterface {
    fn method_names(&self) -> TransportResult<Vec<String>> {
        self.shared.with_task(self.id, |model| Ok(model.methods.clone()))
    }
}

impl CommandsInterface for MemoryInterface {
    fn command_names(&self) -> TransportResult<Vec<String>> {
        self.shared.with_task(self.id, |model| Ok(model.commands.clone()))
    }
}

struct MemoryExpression {
    type_name: String,
}

impl Expression for MemoryExpression {
    fn type_name(&self) -> TransportResult<String> {
        Ok(self.type_name.clone())
    }
}
