//! Registry: discovery of the task contexts advertised by a transport

use std::collections::HashMap;
use std::sync::Arc;

use taskctx_transport::TransportAdapter;
use tracing::{debug, info};

use crate::config::ProxyConfig;
use crate::error::Result;
use crate::task::ComponentProxy;

/// Names of all task contexts currently known to `transport`
///
/// # Errors
///
/// Transport failures are returned unchanged as `ProxyError::Transport`.
pub fn task_names<T>(transport: &T) -> Result<Vec<String>>
where
    T: TransportAdapter + ?Sized,
{
    let names = transport.list_known_names()?;
    debug!("Transport advertises {} task contexts", names.len());
    Ok(names)
}

/// Name under which a deployment process registers one of its tasks
///
/// ```
/// assert_eq!(taskctx::registry::qualified_name("nav_deployment", "planner"), "nav_deployment.planner");
/// ```
pub fn qualified_name(deployment: &str, task: &str) -> String {
    format!("{}.{}", deployment, task)
}

/// Entry point for discovering and resolving task contexts
///
/// # Example
///
/// ```rust
/// use taskctx::transport::memory::{InMemoryTransport, TaskModel};
/// use taskctx::Registry;
///
/// # fn main() -> taskctx::Result<()> {
/// let transport = InMemoryTransport::new();
/// transport.add_task(TaskModel::new("ctrl"));
/// transport.add_task(TaskModel::new("nav"));
///
/// let registry = Registry::new(transport);
/// assert_eq!(registry.list_names()?, vec!["ctrl", "nav"]);
///
/// let nav = registry.get("nav")?;
/// assert_eq!(nav.name(), "nav");
/// assert!(registry.get("missing").unwrap_err().is_not_found());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Registry {
    transport: Arc<dyn TransportAdapter>,
    config: ProxyConfig,
}

impl Registry {
    pub fn new<T>(transport: T) -> Self
    where
        T: TransportAdapter + 'static,
    {
        Self::with_config(Arc::new(transport), ProxyConfig::default())
    }

    /// Create a registry over a shared transport with explicit settings
    pub fn with_config(transport: Arc<dyn TransportAdapter>, config: ProxyConfig) -> Self {
        info!(
            "Creating task registry (name service: {}, connect timeout: {:?})",
            config.name_service.as_deref().unwrap_or("default"),
            config.connect_timeout()
        );
        Self { transport, config }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn TransportAdapter {
        self.transport.as_ref()
    }

    /// Names of all task contexts currently advertised, in transport order
    pub fn list_names(&self) -> Result<Vec<String>> {
        task_names(self.transport.as_ref())
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.list_names()?.iter().any(|n| n == name))
    }

    /// Resolve one task context, see [`ComponentProxy::get`]
    pub fn get(&self, name: &str) -> Result<ComponentProxy> {
        ComponentProxy::get(self.transport.as_ref(), name)
    }

    /// Resolve a set of task contexts, keyed by name
    ///
    /// Used to collect the task handles of a deployment once its process is
    /// running. Fails on the first task that cannot be resolved.
    pub fn get_all<I, S>(&self, names: I) -> Result<HashMap<String, ComponentProxy>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tasks = HashMap::new();
        for name in names {
            let name = name.as_ref();
            tasks.insert(name.to_string(), self.get(name)?);
        }
        debug!("Resolved {} task contexts", tasks.len());
        Ok(tasks)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ProxyError};
    use crate::transport::memory::{InMemoryTransport, TaskModel};

    fn registry() -> (InMemoryTransport, Registry) {
        let transport = InMemoryTransport::new();
        transport.add_task(TaskModel::new("ctrl"));
        transport.add_task(TaskModel::new("nav"));
        (transport.clone(), Registry::new(transport))
    }

    #[test]
    fn test_list_names_in_transport_order() {
        let (_, registry) = registry();
        assert_eq!(registry.list_names().unwrap(), vec!["ctrl", "nav"]);
        assert!(registry.contains("nav").unwrap());
        assert!(!registry.contains("missing").unwrap());
    }

    #[test]
    fn test_list_names_reflects_current_state() {
        let (transport, registry) = registry();
        transport.remove_task("ctrl");
        assert_eq!(registry.list_names().unwrap(), vec!["nav"]);
    }

    #[test]
    fn test_list_names_propagates_transport_failure() {
        let (transport, registry) = registry();
        transport.set_reachable(false);

        let err = registry.list_names().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_get_missing() {
        let (_, registry) = registry();
        let err = registry.get("missing").unwrap_err();
        assert!(matches!(err, ProxyError::TaskNotFound(ref n) if n == "missing"));
    }

    #[test]
    fn test_get_all() {
        let (transport, registry) = registry();
        transport.add_task(TaskModel::new(qualified_name("nav_deployment", "planner")));

        let tasks = registry
            .get_all(["ctrl", "nav_deployment.planner"])
            .unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks["nav_deployment.planner"].name(), "nav_deployment.planner");

        let err = registry.get_all(["ctrl", "ghost"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_config_is_kept() {
        let transport = InMemoryTransport::new();
        let config = ProxyConfig {
            connect_timeout_ms: 50,
            ..Default::default()
        };
        let registry = Registry::with_config(Arc::new(transport), config);
        assert_eq!(registry.config().connect_timeout_ms, 50);
    }
}
