//! Transport implementations and re-exports of the transport contract
//!
//! The traits live in the `taskctx-transport` crate so that transport
//! implementations do not need to depend on the proxy layer. This module
//! re-exports them and provides:
//! - `InMemoryTransport`: an in-process naming service and task store, for
//!   tests and loopback setups

pub mod memory;

pub use memory::{InMemoryTransport, TaskModel};
pub use taskctx_transport::{
    AttributesInterface, CommandsInterface, Expression, MethodsInterface, PortType,
    PortsInterface, RemoteTask, SubInterface, TransportAdapter, TransportError, TransportResult,
};
