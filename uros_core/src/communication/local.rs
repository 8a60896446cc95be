//! In-process transport: a topic registry with per-subscription queues.

use crate::communication::transport::{EndpointId, History, QosProfile, Transport};
use crate::error::{UrosError, UrosResult};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug)]
struct TopicEntry {
    type_name: &'static str,
    publishers: usize,
    subscriptions: Vec<EndpointId>,
}

#[derive(Debug)]
enum Endpoint {
    Publisher {
        topic: String,
    },
    Subscription {
        topic: String,
        history: History,
        queue: VecDeque<Vec<u8>>,
    },
}

#[derive(Debug, Default)]
struct BusState {
    topics: HashMap<String, TopicEntry>,
    endpoints: HashMap<EndpointId, Endpoint>,
}

impl BusState {
    fn attach(&mut self, topic: &str, type_name: &'static str) -> UrosResult<&mut TopicEntry> {
        let entry = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicEntry {
                type_name,
                publishers: 0,
                subscriptions: Vec::new(),
            });

        if entry.type_name != type_name {
            return Err(UrosError::TypeMismatch {
                topic: topic.to_string(),
                existing: entry.type_name.to_string(),
                requested: type_name.to_string(),
            });
        }
        Ok(entry)
    }

    fn detach_if_unused(&mut self, topic: &str) {
        let unused = self
            .topics
            .get(topic)
            .is_some_and(|entry| entry.publishers == 0 && entry.subscriptions.is_empty());
        if unused {
            self.topics.remove(topic);
        }
    }

    fn queue_has_data(&self, id: &EndpointId) -> bool {
        matches!(
            self.endpoints.get(id),
            Some(Endpoint::Subscription { queue, .. }) if !queue.is_empty()
        )
    }
}

/// Message bus shared by every endpoint of one or more supports in a process.
#[derive(Debug, Default)]
pub struct LocalTransport {
    state: Mutex<BusState>,
    data_ready: Condvar,
    failing_publishes: AtomicUsize,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` publishes fail with a transport error.
    /// Nothing is delivered for a failed publish.
    pub fn fail_next_publishes(&self, count: usize) {
        self.failing_publishes.store(count, Ordering::SeqCst);
    }

    /// Type carried by `topic`, if anything is attached to it
    pub fn topic_type(&self, topic: &str) -> Option<&'static str> {
        self.state.lock().topics.get(topic).map(|entry| entry.type_name)
    }

    /// All topics with at least one attached endpoint
    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().topics.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn publisher_count(&self, topic: &str) -> usize {
        self.state
            .lock()
            .topics
            .get(topic)
            .map_or(0, |entry| entry.publishers)
    }

    pub fn subscription_count(&self, topic: &str) -> usize {
        self.state
            .lock()
            .topics
            .get(topic)
            .map_or(0, |entry| entry.subscriptions.len())
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_publishes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Transport for LocalTransport {
    fn register_publisher(&self, topic: &str, type_name: &'static str) -> UrosResult<EndpointId> {
        let mut state = self.state.lock();
        state.attach(topic, type_name)?.publishers += 1;

        let id = Uuid::new_v4();
        state.endpoints.insert(
            id,
            Endpoint::Publisher {
                topic: topic.to_string(),
            },
        );
        log::debug!("publisher {} attached to '{}' ({})", id, topic, type_name);
        Ok(id)
    }

    fn register_subscription(
        &self,
        topic: &str,
        type_name: &'static str,
        qos: QosProfile,
    ) -> UrosResult<EndpointId> {
        if qos.history == History::KeepLast(0) {
            return Err(UrosError::invalid_argument("history depth must be at least 1"));
        }

        let id = Uuid::new_v4();
        let mut state = self.state.lock();
        state.attach(topic, type_name)?.subscriptions.push(id);
        state.endpoints.insert(
            id,
            Endpoint::Subscription {
                topic: topic.to_string(),
                history: qos.history,
                queue: VecDeque::new(),
            },
        );
        log::debug!("subscription {} attached to '{}' ({})", id, topic, type_name);
        Ok(id)
    }

    fn unregister(&self, endpoint: EndpointId) -> UrosResult<()> {
        let mut state = self.state.lock();
        let removed = state
            .endpoints
            .remove(&endpoint)
            .ok_or_else(|| UrosError::Transport(format!("unknown endpoint {}", endpoint)))?;

        let topic = match removed {
            Endpoint::Publisher { topic } => {
                if let Some(entry) = state.topics.get_mut(&topic) {
                    entry.publishers = entry.publishers.saturating_sub(1);
                }
                topic
            }
            Endpoint::Subscription { topic, .. } => {
                if let Some(entry) = state.topics.get_mut(&topic) {
                    entry.subscriptions.retain(|id| *id != endpoint);
                }
                topic
            }
        };
        state.detach_if_unused(&topic);
        Ok(())
    }

    fn publish(&self, publisher: EndpointId, payload: Vec<u8>) -> UrosResult<()> {
        if self.take_injected_failure() {
            return Err(UrosError::Transport("publish rejected by transport".to_string()));
        }

        let mut state = self.state.lock();
        let topic = match state.endpoints.get(&publisher) {
            Some(Endpoint::Publisher { topic }) => topic.clone(),
            _ => {
                return Err(UrosError::Transport(format!(
                    "{} is not a registered publisher",
                    publisher
                )))
            }
        };

        let targets = state
            .topics
            .get(&topic)
            .map(|entry| entry.subscriptions.clone())
            .unwrap_or_default();

        for id in targets {
            if let Some(Endpoint::Subscription { history, queue, .. }) =
                state.endpoints.get_mut(&id)
            {
                if let History::KeepLast(depth) = *history {
                    while queue.len() >= depth {
                        queue.pop_front();
                    }
                }
                queue.push_back(payload.clone());
            }
        }
        drop(state);

        self.data_ready.notify_all();
        Ok(())
    }

    fn take(&self, subscription: EndpointId) -> UrosResult<Option<Vec<u8>>> {
        match self.state.lock().endpoints.get_mut(&subscription) {
            Some(Endpoint::Subscription { queue, .. }) => Ok(queue.pop_front()),
            _ => Err(UrosError::Transport(format!(
                "{} is not a registered subscription",
                subscription
            ))),
        }
    }

    fn has_data(&self, subscription: EndpointId) -> bool {
        self.state.lock().queue_has_data(&subscription)
    }

    fn wait(&self, subscriptions: &[EndpointId], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if subscriptions.iter().any(|id| state.queue_has_data(id)) {
                return true;
            }
            if self.data_ready.wait_until(&mut state, deadline).timed_out() {
                return subscriptions.iter().any(|id| state.queue_has_data(id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const INT32: &str = "std_msgs/msg/Int32";

    #[test]
    fn publish_fans_out_to_all_subscriptions() {
        let bus = LocalTransport::new();
        let publisher = bus.register_publisher("/chatter", INT32).unwrap();
        let a = bus
            .register_subscription("/chatter", INT32, QosProfile::default())
            .unwrap();
        let b = bus
            .register_subscription("/chatter", INT32, QosProfile::default())
            .unwrap();

        bus.publish(publisher, vec![1]).unwrap();

        assert_eq!(bus.take(a).unwrap(), Some(vec![1]));
        assert_eq!(bus.take(b).unwrap(), Some(vec![1]));
        assert_eq!(bus.take(a).unwrap(), None);
    }

    #[test]
    fn keep_last_drops_oldest() {
        let bus = LocalTransport::new();
        let publisher = bus.register_publisher("/t", INT32).unwrap();
        let sub = bus
            .register_subscription("/t", INT32, QosProfile::keep_last(2))
            .unwrap();

        for i in 0..4u8 {
            bus.publish(publisher, vec![i]).unwrap();
        }

        assert_eq!(bus.take(sub).unwrap(), Some(vec![2]));
        assert_eq!(bus.take(sub).unwrap(), Some(vec![3]));
        assert_eq!(bus.take(sub).unwrap(), None);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let bus = LocalTransport::new();
        bus.register_publisher("/t", INT32).unwrap();
        let err = bus
            .register_subscription("/t", "std_msgs/msg/String", QosProfile::default())
            .unwrap_err();
        assert!(matches!(err, UrosError::TypeMismatch { .. }));
    }

    #[test]
    fn topic_disappears_after_last_endpoint() {
        let bus = LocalTransport::new();
        let publisher = bus.register_publisher("/t", INT32).unwrap();
        assert_eq!(bus.topic_names(), vec!["/t".to_string()]);

        bus.unregister(publisher).unwrap();
        assert!(bus.topic_names().is_empty());
        assert!(bus.unregister(publisher).is_err());

        // type can change once nobody is attached
        bus.register_publisher("/t", "std_msgs/msg/String").unwrap();
        assert_eq!(bus.topic_type("/t"), Some("std_msgs/msg/String"));
    }

    #[test]
    fn injected_failures_are_consumed() {
        let bus = LocalTransport::new();
        let publisher = bus.register_publisher("/t", INT32).unwrap();
        let sub = bus
            .register_subscription("/t", INT32, QosProfile::default())
            .unwrap();

        bus.fail_next_publishes(1);
        assert!(bus.publish(publisher, vec![9]).is_err());
        assert!(!bus.has_data(sub));

        bus.publish(publisher, vec![10]).unwrap();
        assert!(bus.has_data(sub));
    }

    #[test]
    fn wait_times_out_without_data() {
        let bus = LocalTransport::new();
        let sub = bus
            .register_subscription("/t", INT32, QosProfile::default())
            .unwrap();
        let start = Instant::now();
        assert!(!bus.wait(&[sub], Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wait_wakes_on_publish_from_another_thread() {
        let bus = Arc::new(LocalTransport::new());
        let sub = bus
            .register_subscription("/t", INT32, QosProfile::default())
            .unwrap();
        let publisher = bus.register_publisher("/t", INT32).unwrap();

        let remote = bus.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.publish(publisher, vec![1]).unwrap();
        });

        assert!(bus.wait(&[sub], Duration::from_secs(5)));
        handle.join().unwrap();
    }
}
