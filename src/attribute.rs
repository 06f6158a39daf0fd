//! Attribute and property proxies

use std::fmt;

use taskctx_transport::Expression;

use crate::task::ComponentProxy;

/// Which table of the remote task a name was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOrigin {
    Property,
    Attribute,
}

/// A remote attribute or property
///
/// Both kinds of task parameters are represented by the same proxy; see
/// [`ComponentProxy::attribute`] for how a name is resolved.
pub struct AttributeProxy<'a> {
    name: String,
    type_name: String,
    origin: AttributeOrigin,
    expression: Box<dyn Expression>,
    owner: &'a ComponentProxy,
}

impl<'a> AttributeProxy<'a> {
    pub(crate) fn new(
        owner: &'a ComponentProxy,
        name: &str,
        origin: AttributeOrigin,
        type_name: String,
        expression: Box<dyn Expression>,
    ) -> Self {
        Self {
            name: name.to_string(),
            type_name,
            origin,
            expression,
            owner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type name, as reported when the attribute was looked up
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn origin(&self) -> AttributeOrigin {
        self.origin
    }

    pub fn is_property(&self) -> bool {
        self.origin == AttributeOrigin::Property
    }

    pub fn owner(&self) -> &'a ComponentProxy {
        self.owner
    }

    /// The remote expression handle behind this attribute
    pub fn expression(&self) -> &dyn Expression {
        self.expression.as_ref()
    }
}

impl fmt::Debug for AttributeProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeProxy")
            .field("task", &self.owner.name())
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for AttributeProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner.name(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::{InMemoryTransport, TaskModel};

    #[test]
    fn test_expression_reports_declared_type() {
        let transport = InMemoryTransport::new();
        transport.add_task(TaskModel::new("nav").with_attribute("max_speed", "double"));

        let task = ComponentProxy::get(&transport, "nav").unwrap();
        let attribute = task.attribute("max_speed").unwrap();

        assert!(!attribute.is_property());
        assert_eq!(attribute.expression().type_name().unwrap(), "double");
        assert_eq!(attribute.owner().name(), "nav");
        assert_eq!(attribute.to_string(), "nav.max_speed");
    }
}
