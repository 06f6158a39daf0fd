//! Integration tests for taskctx
//!
//! These tests exercise the public API against the in-memory transport, plus
//! a hand-written transport for failure modes the in-memory one cannot
//! produce.

use std::any::Any;
use std::sync::Arc;

use taskctx::transport::memory::{InMemoryTransport, TaskModel};
use taskctx::transport::{
    AttributesInterface, CommandsInterface, MethodsInterface, PortsInterface, RemoteTask,
    TransportResult,
};
use taskctx::{
    ComponentProxy, ErrorKind, ExecutionState, PortProxy, PortType, ProxyConfig, ProxyError,
    Registry, TransportAdapter, TransportError,
};

fn control_stack() -> InMemoryTransport {
    let transport = InMemoryTransport::new();
    transport.add_task(
        TaskModel::new("ctrl")
            .with_port("in1", PortType::Input, "double")
            .with_port("out1", PortType::Output, "/base/samples/RigidBodyState")
            .with_property("gain", "double")
            .with_attribute("gain", "int")
            .with_attribute("cycles", "int"),
    );
    transport.add_task(
        TaskModel::new("nav")
            .with_state(ExecutionState::Running.raw())
            .with_port("pose", PortType::Input, "/base/Pose"),
    );
    transport
}

#[test]
fn test_discovery_scenario() {
    let registry = Registry::new(control_stack());

    assert_eq!(registry.list_names().unwrap(), vec!["ctrl", "nav"]);

    let nav = registry.get("nav").unwrap();
    assert_eq!(nav.name(), "nav");
    assert_eq!(nav.state().unwrap(), ExecutionState::Running);

    let err = registry.get("missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "task context 'missing' not found");
}

#[test]
fn test_remote_identity() {
    let registry = Registry::new(control_stack());

    let first = registry.get("ctrl").unwrap();
    let second = registry.get("ctrl").unwrap();
    assert_eq!(first, second);
    assert!(first.equals(&second));
    assert!(!first.equals(&42_u32));
    assert_ne!(first, registry.get("nav").unwrap());
}

#[test]
fn test_restarted_task_is_a_different_remote_object() {
    let transport = control_stack();
    let registry = Registry::new(transport.clone());

    let before = registry.get("nav").unwrap();
    transport.add_task(TaskModel::new("nav"));
    let after = registry.get("nav").unwrap();

    assert_ne!(before, after);
    assert_eq!(before.state().unwrap_err().kind(), ErrorKind::Transport);
}

#[test]
fn test_ports() {
    let registry = Registry::new(control_stack());
    let ctrl = registry.get("ctrl").unwrap();

    let port = ctrl.port("in1").unwrap();
    match &port {
        PortProxy::Input(info) => assert_eq!(info.owner().name(), "ctrl"),
        PortProxy::Output(_) => panic!("in1 should be an input port"),
    }
    assert_eq!(port.type_name(), "double");

    let names: Vec<String> = ctrl
        .ports()
        .unwrap()
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    assert_eq!(names, vec!["in1", "out1"]);

    let mut visited = Vec::new();
    ctrl.each_port(|p| visited.push(p)).unwrap();
    assert_eq!(visited.len(), 2);
    assert_eq!(visited[0], ctrl.port("in1").unwrap());
    assert_eq!(visited[1], ctrl.port("out1").unwrap());
}

#[test]
fn test_missing_port() {
    let registry = Registry::new(control_stack());
    let nav = registry.get("nav").unwrap();

    let err = nav.port("velocity").unwrap_err();
    assert!(err.is_not_found());
    let message = err.to_string();
    assert!(message.contains("nav"));
    assert!(message.contains("velocity"));
}

#[test]
fn test_connection_status() {
    let transport = control_stack();
    let registry = Registry::new(transport.clone());
    let nav = registry.get("nav").unwrap();
    let pose = nav.port("pose").unwrap();

    assert!(!pose.is_connected().unwrap());
    transport.set_connected("nav", "pose", true);
    assert!(pose.is_connected().unwrap());
    assert!(nav.port("pose").unwrap().is_connected().unwrap());
}

#[test]
fn test_attributes() {
    let registry = Registry::new(control_stack());
    let ctrl = registry.get("ctrl").unwrap();

    assert_eq!(ctrl.attribute("gain").unwrap().type_name(), "double");
    assert_eq!(ctrl.attribute("cycles").unwrap().type_name(), "int");

    let err = ctrl.attribute("threshold").unwrap_err();
    assert!(matches!(
        &err,
        ProxyError::AttributeNotFound { name, .. } if name == "threshold"
    ));

    let mut visited = Vec::new();
    ctrl.each_attribute(|a| visited.push(a.name().to_string()))
        .unwrap();
    assert_eq!(visited, vec!["gain", "cycles", "gain"]);
}

#[test]
fn test_state_is_always_in_range() {
    let transport = control_stack();
    let registry = Registry::new(transport.clone());
    let ctrl = registry.get("ctrl").unwrap();

    for raw in -2..10 {
        transport.set_state("ctrl", raw);
        match ctrl.state() {
            Ok(state) => assert!(ExecutionState::ALL.contains(&state)),
            Err(err) => assert_eq!(err.kind(), ErrorKind::Transport),
        }
    }
}

#[test]
fn test_detached_port_after_release() {
    let registry = Registry::new(control_stack());
    let handle = {
        let ctrl = registry.get("ctrl").unwrap();
        let port = ctrl.port("out1").unwrap();
        port.detach()
    };

    assert_eq!(handle.direction(), PortType::Output);
    assert_eq!(handle.is_connected().unwrap_err().kind(), ErrorKind::Usage);
}

#[test]
fn test_registry_with_config() {
    let transport: Arc<dyn TransportAdapter> = Arc::new(control_stack());
    let config = ProxyConfig::from_toml_str("connect_timeout_ms = 50").unwrap();
    let registry = Registry::with_config(transport, config);

    assert_eq!(registry.config().connect_timeout_ms, 50);
    assert_eq!(registry.list_names().unwrap().len(), 2);
}

/// Transport whose tasks resolve but can no longer be reached afterwards
struct DroppedLink;

struct DroppedTask;

fn link_down<T>() -> TransportResult<T> {
    Err(TransportError::Unreachable("link down".to_string()))
}

impl TransportAdapter for DroppedLink {
    fn resolve_by_name(&self, _name: &str) -> TransportResult<Box<dyn RemoteTask>> {
        Ok(Box::new(DroppedTask))
    }

    fn list_known_names(&self) -> TransportResult<Vec<String>> {
        Ok(vec!["ctrl".to_string()])
    }
}

impl RemoteTask for DroppedTask {
    fn ports(&self) -> TransportResult<Box<dyn PortsInterface>> {
        link_down()
    }

    fn attributes(&self) -> TransportResult<Box<dyn AttributesInterface>> {
        link_down()
    }

    fn methods(&self) -> TransportResult<Box<dyn MethodsInterface>> {
        link_down()
    }

    fn commands(&self) -> TransportResult<Box<dyn CommandsInterface>> {
        link_down()
    }

    fn execution_state(&self) -> TransportResult<i32> {
        link_down()
    }

    fn is_equivalent(&self, _other: &dyn RemoteTask) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_connectivity_loss_during_resolution_is_a_transport_error() {
    let err = ComponentProxy::get(&DroppedLink, "ctrl").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(
        err.transport_error(),
        Some(&TransportError::Unreachable("link down".to_string()))
    );
}
