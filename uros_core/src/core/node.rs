use crate::core::names;
use crate::core::support::{Context, Support};
use crate::error::{UrosError, UrosResult};
use crate::params::RuntimeParams;
use std::fmt;

/// A named endpoint grouping publishers, subscriptions and parameters.
pub struct Node {
    name: String,
    namespace: String,
    fqn: String,
    context: Context,
    valid: bool,

    // Node parameters
    params: RuntimeParams,
}

impl Node {
    /// Create a node with default options.
    ///
    /// An empty `namespace` places the node at the root (`/`).
    pub fn init_default(name: &str, namespace: &str, support: &Support) -> UrosResult<Self> {
        support.context().ensure_valid()?;
        names::validate_node_name(name)?;
        let namespace = names::normalize_namespace(namespace)?;
        let fqn = names::node_fqn(name, &namespace);

        log::info!("node '{}' created", fqn);

        Ok(Self {
            name: name.to_string(),
            namespace,
            fqn,
            context: support.context().clone(),
            valid: true,
            params: RuntimeParams::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn params(&self) -> &RuntimeParams {
        &self.params
    }

    /// A node is usable while it is not finalized and its context is alive
    pub fn is_valid(&self) -> bool {
        self.valid && self.context.is_valid()
    }

    pub fn ensure_valid(&self) -> UrosResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(UrosError::NodeInvalid(self.fqn.clone()))
        }
    }

    /// Resolve a topic name relative to this node
    pub fn resolve_topic_name(&self, topic: &str) -> UrosResult<String> {
        names::expand_topic_name(topic, &self.name, &self.namespace)
    }

    /// Finalize the node. Endpoints should be finalized first.
    pub fn fini(&mut self) -> UrosResult<()> {
        if !self.valid {
            return Err(UrosError::NodeInvalid(self.fqn.clone()));
        }
        self.valid = false;
        log::info!("node '{}' finalized", self.fqn);
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("fqn", &self.fqn)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::support::{Allocator, InitOptions};

    fn support() -> Support {
        Support::init(InitOptions::default(), &Allocator::default_allocator()).unwrap()
    }

    #[test]
    fn root_namespace_node() {
        let support = support();
        let node = Node::init_default("freertos_int32_publisher", "", &support).unwrap();
        assert_eq!(node.namespace(), "/");
        assert_eq!(node.fully_qualified_name(), "/freertos_int32_publisher");
        assert_eq!(
            node.resolve_topic_name("freertos_int32_publisher").unwrap(),
            "/freertos_int32_publisher"
        );
    }

    #[test]
    fn invalid_name_is_rejected() {
        let support = support();
        let err = Node::init_default("bad name", "", &support).unwrap_err();
        assert_eq!(err.code(), 201);
    }

    #[test]
    fn node_on_shut_down_context_fails() {
        let support = support();
        support.context().shutdown().unwrap();
        assert!(matches!(
            Node::init_default("late", "", &support),
            Err(UrosError::NotInit)
        ));
    }

    #[test]
    fn fini_invalidates_once() {
        let support = support();
        let mut node = Node::init_default("n", "ns", &support).unwrap();
        node.fini().unwrap();
        assert!(!node.is_valid());
        assert_eq!(node.fini().unwrap_err().code(), 200);
    }
}
