use super::Broker;
use super::outbound::OutboundQueues;
use super::registry::TopicRegistry;
use super::topic::Topic;
use crate::protocol::response::info;
use crate::protocol::{Message, NameIdPair, Request, Response};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn publish_to(topic: &NameIdPair, content: &str) -> Request {
    Request::Publish {
        message: Message::new(NameIdPair::generate("publisher"), topic.clone(), content),
    }
}

/// Drain everything queued for `client_id`.
fn drain(broker: &Broker, client_id: &Uuid) -> Vec<Response> {
    std::iter::from_fn(|| broker.queues.try_dequeue(client_id)).collect()
}

#[test]
fn test_topic_new() {
    let info = NameIdPair::generate("test_topic");
    let topic = Topic::new(info.clone(), 0);
    assert_eq!(topic.info, info);
    assert!(topic.subscribers.is_empty());
}

#[test]
fn test_topic_subscribe_is_idempotent() {
    let mut topic = Topic::new(NameIdPair::generate("test_topic"), 0);
    let client = NameIdPair::generate("client1");
    topic.subscribe(client.clone());
    topic.subscribe(client.clone());
    assert_eq!(topic.subscribers.len(), 1);
    assert!(topic.subscribers.contains_key(&client.id));
}

#[test]
fn test_topic_unsubscribe() {
    let mut topic = Topic::new(NameIdPair::generate("test_topic"), 0);
    let client = NameIdPair::generate("client1");
    topic.subscribe(client.clone());
    assert!(topic.unsubscribe(&client.id));
    assert!(!topic.unsubscribe(&client.id));
    assert!(topic.subscribers.is_empty());
}

#[test]
fn test_registry_assigns_distinct_ids_even_for_duplicate_names() {
    let registry = TopicRegistry::new();
    let names = ["weather", "weather", "news", "weather", ""];
    let ids: HashSet<Uuid> = names
        .iter()
        .map(|name| registry.create_topic(name).id)
        .collect();
    assert_eq!(ids.len(), names.len());
    assert_eq!(registry.len(), names.len());
}

#[test]
fn test_registry_ids_unique_under_concurrent_creation() {
    let registry = Arc::new(TopicRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                (0..50)
                    .map(|_| registry.create_topic("shared").id)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.extend(handle.join().unwrap());
    }
    assert_eq!(ids.len(), 400);
}

#[test]
fn test_list_topics_in_creation_order() {
    let registry = TopicRegistry::new();
    let a = registry.create_topic("a");
    let b = registry.create_topic("b");
    let c = registry.create_topic("a");
    registry.subscribe(&b.id, NameIdPair::generate("sub"));

    assert_eq!(registry.list_topics(), vec![a, b, c]);
}

#[test]
fn test_subscribe_unknown_topic() {
    let registry = TopicRegistry::new();
    assert!(!registry.subscribe(&Uuid::new_v4(), NameIdPair::generate("sub")));
    assert!(registry.is_empty());
}

#[test]
fn test_subscribe_twice_keeps_one_entry() {
    let registry = TopicRegistry::new();
    let topic = registry.create_topic("weather");
    let sub = NameIdPair::generate("sub");

    assert!(registry.subscribe(&topic.id, sub.clone()));
    assert!(registry.subscribe(&topic.id, sub.clone()));
    assert_eq!(registry.subscribers_of(&topic.id).len(), 1);
}

#[test]
fn test_unsubscribe_unknown_topic_changes_nothing() {
    let registry = TopicRegistry::new();
    let topic = registry.create_topic("weather");
    let sub = NameIdPair::generate("sub");
    registry.subscribe(&topic.id, sub.clone());

    assert!(!registry.unsubscribe(&Uuid::new_v4(), &sub.id));
    assert_eq!(registry.subscribers_of(&topic.id), HashSet::from([sub.id]));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_unsubscribe_absent_subscriber() {
    let registry = TopicRegistry::new();
    let topic = registry.create_topic("weather");
    assert!(!registry.unsubscribe(&topic.id, &Uuid::new_v4()));
}

#[test]
fn test_subscribers_of_unknown_topic_is_empty() {
    let registry = TopicRegistry::new();
    assert!(registry.subscribers_of(&Uuid::new_v4()).is_empty());
}

#[test]
fn test_remove_subscriber_everywhere() {
    let registry = TopicRegistry::new();
    let a = registry.create_topic("a");
    let b = registry.create_topic("b");
    let sub = NameIdPair::generate("sub");
    let other = NameIdPair::generate("other");
    registry.subscribe(&a.id, sub.clone());
    registry.subscribe(&b.id, sub.clone());
    registry.subscribe(&b.id, other.clone());

    assert_eq!(registry.remove_subscriber(&sub.id), 2);
    assert!(registry.subscribers_of(&a.id).is_empty());
    assert_eq!(registry.subscribers_of(&b.id), HashSet::from([other.id]));
}

#[test]
fn test_outbound_queue_is_fifo_and_lazy() {
    let queues = OutboundQueues::new();
    let client = Uuid::new_v4();
    assert!(!queues.contains(&client));
    assert!(queues.try_dequeue(&client).is_none());

    queues.enqueue(client, Response::info("first"));
    queues.enqueue(client, Response::info("second"));
    assert!(queues.contains(&client));
    assert_eq!(queues.pending(&client), 2);

    assert_eq!(queues.try_dequeue(&client), Some(Response::info("first")));
    assert_eq!(queues.try_dequeue(&client), Some(Response::info("second")));
    assert_eq!(queues.try_dequeue(&client), None);
}

#[test]
fn test_outbound_discard_drops_pending() {
    let queues = OutboundQueues::new();
    let client = Uuid::new_v4();
    queues.enqueue(client, Response::info("lost"));

    assert_eq!(queues.discard(&client), 1);
    assert!(!queues.contains(&client));
    assert_eq!(queues.discard(&client), 0);
}

#[test]
fn test_deliver_skips_clients_without_a_queue() {
    let queues = OutboundQueues::new();
    let client = Uuid::new_v4();
    assert!(!queues.deliver(&client, Response::info("nobody")));
    assert!(queues.is_empty());

    queues.register(client);
    assert!(queues.deliver(&client, Response::info("somebody")));
    assert_eq!(queues.pending(&client), 1);
}

#[test]
fn test_broker_connect_queues_welcome() {
    let broker = Broker::new();
    let client = Uuid::new_v4();
    broker.connect(client);
    assert_eq!(
        drain(&broker, &client),
        vec![Response::Welcome { client_id: client }]
    );
}

#[test]
fn test_handle_create_and_list() {
    let broker = Broker::new();
    let requester = Uuid::new_v4();

    let created = broker.handle(
        Request::CreateTopic {
            name: "weather".to_string(),
        },
        requester,
    );
    let Response::TopicCreated { topic_info } = created else {
        panic!("expected TopicCreated, got {created:?}");
    };
    assert_eq!(topic_info.name, "weather");

    assert_eq!(
        broker.handle(Request::ListTopics {}, requester),
        Response::ListTopicsResult {
            topics: vec![topic_info]
        }
    );
}

#[test]
fn test_handle_subscribe_and_unsubscribe_answers() {
    let broker = Broker::new();
    let requester = Uuid::new_v4();
    let topic = broker.registry.create_topic("weather");
    let subscriber = NameIdPair::new("sub", requester);

    let subscribe = |topic_id| Request::Subscribe {
        subscriber: subscriber.clone(),
        topic_id,
    };
    let unsubscribe = |topic_id| Request::Unsubscribe {
        subscriber: subscriber.clone(),
        topic_id,
    };

    assert_eq!(
        broker.handle(subscribe(topic.id), requester),
        Response::info(info::ADDED)
    );
    assert_eq!(
        broker.handle(subscribe(Uuid::new_v4()), requester),
        Response::info(info::TOPIC_DOES_NOT_EXIST)
    );
    assert_eq!(
        broker.handle(unsubscribe(topic.id), requester),
        Response::info(info::REMOVED)
    );
    assert_eq!(
        broker.handle(unsubscribe(topic.id), requester),
        Response::info(info::NOT_FOUND)
    );
}

#[test]
fn test_publish_fans_out_to_every_subscriber_once() {
    let broker = Broker::new();
    let (a, b, bystander, publisher) = (
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
    );
    for client in [a, b, bystander, publisher] {
        broker.connect(client);
        drain(&broker, &client);
    }
    let topic = broker.registry.create_topic("weather");
    broker.registry.subscribe(&topic.id, NameIdPair::new("a", a));
    broker.registry.subscribe(&topic.id, NameIdPair::new("b", b));

    let request = publish_to(&topic, "sunny");
    let Request::Publish { message } = request.clone() else {
        unreachable!()
    };
    let response = broker.handle(request, publisher);

    assert_eq!(response, Response::info(info::PUBLISHED));
    for client in [a, b] {
        assert_eq!(
            drain(&broker, &client),
            vec![Response::NewMessage {
                message: message.clone()
            }]
        );
    }
    assert!(drain(&broker, &bystander).is_empty());
    // the direct response is returned, not queued
    assert!(drain(&broker, &publisher).is_empty());
}

#[test]
fn test_publish_to_nonexistent_topic() {
    let broker = Broker::new();
    let subscriber = Uuid::new_v4();
    broker.connect(subscriber);
    drain(&broker, &subscriber);
    let real = broker.registry.create_topic("weather");
    broker
        .registry
        .subscribe(&real.id, NameIdPair::new("s", subscriber));

    let ghost = NameIdPair::generate("weather");
    let response = broker.handle(publish_to(&ghost, "sunny"), Uuid::new_v4());

    assert_eq!(response, Response::info(info::TOPIC_DOES_NOT_EXIST));
    assert!(drain(&broker, &subscriber).is_empty());
    assert_eq!(broker.queues.len(), 1);
}

#[test]
fn test_disconnect_cleans_up_client() {
    let broker = Broker::new();
    let client = Uuid::new_v4();
    broker.connect(client);
    let topic = broker.registry.create_topic("weather");
    broker
        .registry
        .subscribe(&topic.id, NameIdPair::new("s", client));

    broker.disconnect(&client);
    assert!(!broker.queues.contains(&client));
    assert!(broker.registry.subscribers_of(&topic.id).is_empty());

    // publishing again neither fails nor resurrects the queue
    let response = broker.handle(publish_to(&topic, "again"), Uuid::new_v4());
    assert_eq!(response, Response::info(info::PUBLISHED));
    assert!(!broker.queues.contains(&client));
    assert!(broker.queues.is_empty());
}

#[test]
fn test_end_to_end_scenario_through_the_engine() {
    let broker = Broker::new();
    let (p, s) = (Uuid::new_v4(), Uuid::new_v4());
    broker.connect(p);
    broker.connect(s);
    drain(&broker, &p);
    drain(&broker, &s);
    let publisher = NameIdPair::new("P", p);
    let subscriber = NameIdPair::new("S", s);

    let Response::TopicCreated { topic_info } = broker.handle(
        Request::CreateTopic {
            name: "weather".to_string(),
        },
        p,
    ) else {
        panic!("expected TopicCreated");
    };
    assert_eq!(topic_info.name, "weather");

    assert_eq!(
        broker.handle(Request::ListTopics {}, s),
        Response::ListTopicsResult {
            topics: vec![topic_info.clone()]
        }
    );
    assert_eq!(
        broker.handle(
            Request::Subscribe {
                subscriber,
                topic_id: topic_info.id
            },
            s
        ),
        Response::info(info::ADDED)
    );

    let message = Message::new(publisher.clone(), topic_info.clone(), "sunny");
    assert_eq!(
        broker.handle(
            Request::Publish {
                message: message.clone()
            },
            p
        ),
        Response::info(info::PUBLISHED)
    );

    let delivered = drain(&broker, &s);
    assert_eq!(delivered.len(), 1);
    let Response::NewMessage { message: got } = &delivered[0] else {
        panic!("expected NewMessage, got {delivered:?}");
    };
    assert_eq!(got.publisher, publisher);
    assert_eq!(got.topic, topic_info);
    assert_eq!(got.content, "sunny");
}
