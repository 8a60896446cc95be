// Publisher / subscription behaviour over a shared in-process transport
use std::sync::Arc;
use uros_core::error::UrosError;
use uros_core::{
    Allocator, InitOptions, Int32, LocalTransport, Node, Publisher, QosProfile, Subscription,
    Support,
};

fn support_on(bus: &Arc<LocalTransport>) -> Support {
    Support::init(
        InitOptions::new().with_transport(bus.clone()),
        &Allocator::default_allocator(),
    )
    .unwrap()
}

#[test]
fn messages_cross_between_supports_on_one_bus() {
    let bus = Arc::new(LocalTransport::new());
    let left = support_on(&bus);
    let right = support_on(&bus);

    let talker = Node::init_default("talker", "", &left).unwrap();
    let listener = Node::init_default("listener", "", &right).unwrap();

    let publisher: Publisher<Int32> = Publisher::init_default(&talker, "chatter").unwrap();
    let subscription: Subscription<Int32> =
        Subscription::init_default(&listener, "/chatter").unwrap();

    assert_eq!(publisher.topic_name(), "/chatter");
    assert_eq!(bus.publisher_count("/chatter"), 1);
    assert_eq!(bus.subscription_count("/chatter"), 1);

    publisher.publish(&Int32::new(41)).unwrap();
    publisher.publish(&Int32::new(42)).unwrap();

    let mut buffer = Int32::default();
    subscription.take(&mut buffer).unwrap();
    assert_eq!(buffer.data, 41);
    assert_eq!(subscription.take_message().unwrap(), Some(Int32::new(42)));
    assert_eq!(subscription.take_message().unwrap(), None);

    assert_eq!(publisher.metrics().messages_sent, 2);
    assert_eq!(subscription.metrics().messages_received, 2);
    assert_eq!(subscription.metrics().recv_failures, 1);
}

#[test]
fn empty_take_leaves_buffer_untouched() {
    let bus = Arc::new(LocalTransport::new());
    let support = support_on(&bus);
    let node = Node::init_default("n", "", &support).unwrap();
    let subscription: Subscription<Int32> = Subscription::init_default(&node, "t").unwrap();

    let mut buffer = Int32::new(5);
    let err = subscription.take(&mut buffer).unwrap_err();
    assert_eq!(err.code(), 401);
    assert_eq!(buffer.data, 5);
}

#[test]
fn namespaced_node_resolves_relative_topics() {
    let bus = Arc::new(LocalTransport::new());
    let support = support_on(&bus);
    let node = Node::init_default("arm", "robot", &support).unwrap();

    let relative: Publisher<Int32> = Publisher::init_default(&node, "joint").unwrap();
    let private: Publisher<Int32> = Publisher::init_default(&node, "~/status").unwrap();

    assert_eq!(relative.topic_name(), "/robot/joint");
    assert_eq!(private.topic_name(), "/robot/arm/status");
}

#[test]
fn invalid_topic_name_fails_creation() {
    let bus = Arc::new(LocalTransport::new());
    let support = support_on(&bus);
    let node = Node::init_default("n", "", &support).unwrap();

    let err = Publisher::<Int32>::init_default(&node, "bad//topic").unwrap_err();
    assert_eq!(err.code(), 103);
    assert!(bus.topic_names().is_empty());
}

#[test]
fn finalized_publisher_rejects_publish() {
    let bus = Arc::new(LocalTransport::new());
    let support = support_on(&bus);
    let node = Node::init_default("n", "", &support).unwrap();
    let publisher: Publisher<Int32> = Publisher::init_default(&node, "t").unwrap();

    publisher.fini(&node).unwrap();
    assert!(!publisher.is_valid());
    assert_eq!(bus.publisher_count("/t"), 0);

    let err = publisher.publish(&Int32::new(1)).unwrap_err();
    assert!(matches!(err, UrosError::PublisherInvalid(_)));
    assert_eq!(err.code(), 300);

    // second fini is an error too
    assert!(publisher.fini(&node).is_err());
}

#[test]
fn endpoints_need_a_valid_node() {
    let bus = Arc::new(LocalTransport::new());
    let support = support_on(&bus);
    let mut node = Node::init_default("n", "", &support).unwrap();
    let subscription: Subscription<Int32> = Subscription::init_default(&node, "t").unwrap();

    node.fini().unwrap();
    assert_eq!(
        Publisher::<Int32>::init_default(&node, "t").unwrap_err().code(),
        200
    );
    // finalizing against a dead node is refused
    assert_eq!(subscription.fini(&node).unwrap_err().code(), 200);
}

#[test]
fn dropping_the_last_clone_detaches_endpoint() {
    let bus = Arc::new(LocalTransport::new());
    let support = support_on(&bus);
    let node = Node::init_default("n", "", &support).unwrap();

    let subscription: Subscription<Int32> =
        Subscription::init(&node, "t", QosProfile::sensor_data()).unwrap();
    let clone = subscription.clone();
    drop(subscription);
    assert_eq!(bus.subscription_count("/t"), 1);

    drop(clone);
    assert_eq!(bus.subscription_count("/t"), 0);
}

#[test]
fn publish_after_context_shutdown_fails() {
    let bus = Arc::new(LocalTransport::new());
    let support = support_on(&bus);
    let node = Node::init_default("n", "", &support).unwrap();
    let publisher: Publisher<Int32> = Publisher::init_default(&node, "t").unwrap();

    support.context().shutdown().unwrap();
    assert!(publisher.publish(&Int32::new(1)).is_err());
    assert_eq!(publisher.metrics().send_failures, 1);
}
