use crate::communication::message::Message;
use crate::communication::metrics::{AtomicEndpointMetrics, EndpointMetrics};
use crate::communication::transport::{EndpointId, QosProfile, Transport};
use crate::core::node::Node;
use crate::core::support::Context;
use crate::error::{UrosError, UrosResult};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct SubscriptionInner {
    id: EndpointId,
    topic_name: String,
    qos: QosProfile,
    transport: Arc<dyn Transport>,
    context: Context,
    valid: AtomicBool,
    metrics: AtomicEndpointMetrics,
}

impl Drop for SubscriptionInner {
    fn drop(&mut self) {
        if self.valid.load(Ordering::Acquire) {
            let _ = self.transport.unregister(self.id);
        }
    }
}

/// Typed subscription bound to one fully qualified topic.
///
/// Clones share the same queue; the executor keeps one clone while the
/// application keeps another for finalization.
pub struct Subscription<M: Message> {
    inner: Arc<SubscriptionInner>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> Clone for Subscription<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Message> fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic_name", &self.inner.topic_name)
            .field("type_name", &M::TYPE_NAME)
            .field("qos", &self.inner.qos)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<M: Message> Subscription<M> {
    /// Create a subscription on `topic` with the default QoS profile
    pub fn init_default(node: &Node, topic: &str) -> UrosResult<Self> {
        Self::init(node, topic, QosProfile::default())
    }

    pub fn init(node: &Node, topic: &str, qos: QosProfile) -> UrosResult<Self> {
        node.ensure_valid()?;
        let topic_name = node.resolve_topic_name(topic)?;
        let transport = node.context().transport().clone();
        let id = transport.register_subscription(&topic_name, M::TYPE_NAME, qos)?;

        log::info!(
            "subscription on '{}' ({}) created by '{}'",
            topic_name,
            M::TYPE_NAME,
            node.fully_qualified_name()
        );

        Ok(Self {
            inner: Arc::new(SubscriptionInner {
                id,
                topic_name,
                qos,
                transport,
                context: node.context().clone(),
                valid: AtomicBool::new(true),
                metrics: AtomicEndpointMetrics::default(),
            }),
            _marker: PhantomData,
        })
    }

    /// Take the oldest queued message into `buffer`.
    ///
    /// Fails with `SubscriptionTakeFailed` when nothing is queued; `buffer`
    /// is left untouched in that case.
    pub fn take(&self, buffer: &mut M) -> UrosResult<()> {
        if !self.is_valid() {
            return Err(UrosError::SubscriptionInvalid(self.inner.topic_name.clone()));
        }

        match self.inner.transport.take(self.inner.id)? {
            Some(payload) => {
                *buffer = M::decode(&payload)?;
                self.inner.metrics.record_received();
                log::trace!("'{}' -> {}", self.inner.topic_name, buffer.log_summary());
                Ok(())
            }
            None => {
                self.inner.metrics.record_recv_failure();
                Err(UrosError::SubscriptionTakeFailed(
                    self.inner.topic_name.clone(),
                ))
            }
        }
    }

    /// Like [`Subscription::take`] but returns `None` instead of failing on an empty queue
    pub fn take_message(&self) -> UrosResult<Option<M>> {
        let mut buffer = M::default();
        match self.take(&mut buffer) {
            Ok(()) => Ok(Some(buffer)),
            Err(UrosError::SubscriptionTakeFailed(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn has_data(&self) -> bool {
        self.is_valid() && self.inner.transport.has_data(self.inner.id)
    }

    pub fn topic_name(&self) -> &str {
        &self.inner.topic_name
    }

    pub fn endpoint_id(&self) -> EndpointId {
        self.inner.id
    }

    pub fn qos(&self) -> QosProfile {
        self.inner.qos
    }

    pub fn metrics(&self) -> EndpointMetrics {
        self.inner.metrics.snapshot()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire) && self.inner.context.is_valid()
    }

    /// Detach from the topic and drop queued messages
    pub fn fini(&self, node: &Node) -> UrosResult<()> {
        node.ensure_valid()?;
        if !self.inner.valid.swap(false, Ordering::AcqRel) {
            return Err(UrosError::SubscriptionInvalid(
                self.inner.topic_name.clone(),
            ));
        }
        self.inner.transport.unregister(self.inner.id)?;
        log::info!("subscription on '{}' finalized", self.inner.topic_name);
        Ok(())
    }
}
