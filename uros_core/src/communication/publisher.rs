use crate::communication::message::Message;
use crate::communication::metrics::{AtomicEndpointMetrics, EndpointMetrics};
use crate::communication::transport::{EndpointId, Transport};
use crate::core::node::Node;
use crate::core::support::Context;
use crate::error::{UrosError, UrosResult};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct PublisherInner {
    id: EndpointId,
    topic_name: String,
    transport: Arc<dyn Transport>,
    context: Context,
    valid: AtomicBool,
    metrics: AtomicEndpointMetrics,
}

impl Drop for PublisherInner {
    fn drop(&mut self) {
        if self.valid.load(Ordering::Acquire) {
            let _ = self.transport.unregister(self.id);
        }
    }
}

/// Typed publisher bound to one fully qualified topic.
///
/// Clones share the same endpoint; it is detached on [`Publisher::fini`]
/// or when the last clone is dropped.
pub struct Publisher<M: Message> {
    inner: Arc<PublisherInner>,
    _marker: PhantomData<fn(M)>,
}

impl<M: Message> Clone for Publisher<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Message> fmt::Debug for Publisher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("topic_name", &self.inner.topic_name)
            .field("type_name", &M::TYPE_NAME)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<M: Message> Publisher<M> {
    /// Create a publisher on `topic`, resolved relative to `node`
    pub fn init_default(node: &Node, topic: &str) -> UrosResult<Self> {
        node.ensure_valid()?;
        let topic_name = node.resolve_topic_name(topic)?;
        let transport = node.context().transport().clone();
        let id = transport.register_publisher(&topic_name, M::TYPE_NAME)?;

        log::info!(
            "publisher on '{}' ({}) created by '{}'",
            topic_name,
            M::TYPE_NAME,
            node.fully_qualified_name()
        );

        Ok(Self {
            inner: Arc::new(PublisherInner {
                id,
                topic_name,
                transport,
                context: node.context().clone(),
                valid: AtomicBool::new(true),
                metrics: AtomicEndpointMetrics::default(),
            }),
            _marker: PhantomData,
        })
    }

    /// Serialize `msg` and hand it to the transport
    pub fn publish(&self, msg: &M) -> UrosResult<()> {
        if !self.is_valid() {
            self.inner.metrics.record_send_failure();
            return Err(UrosError::PublisherInvalid(self.inner.topic_name.clone()));
        }

        let payload = msg.encode()?;
        match self.inner.transport.publish(self.inner.id, payload) {
            Ok(()) => {
                self.inner.metrics.record_sent();
                log::trace!("'{}' <- {}", self.inner.topic_name, msg.log_summary());
                Ok(())
            }
            Err(e) => {
                self.inner.metrics.record_send_failure();
                Err(e)
            }
        }
    }

    pub fn topic_name(&self) -> &str {
        &self.inner.topic_name
    }

    pub fn gid(&self) -> EndpointId {
        self.inner.id
    }

    pub fn metrics(&self) -> EndpointMetrics {
        self.inner.metrics.snapshot()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire) && self.inner.context.is_valid()
    }

    /// Detach from the topic. Later publishes fail with `PublisherInvalid`.
    pub fn fini(&self, node: &Node) -> UrosResult<()> {
        node.ensure_valid()?;
        if !self.inner.valid.swap(false, Ordering::AcqRel) {
            return Err(UrosError::PublisherInvalid(self.inner.topic_name.clone()));
        }
        self.inner.transport.unregister(self.inner.id)?;
        log::info!("publisher on '{}' finalized", self.inner.topic_name);
        Ok(())
    }
}
