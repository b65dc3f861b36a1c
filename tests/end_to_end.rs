use std::sync::Arc;
use std::time::Duration;

use relaybus::broker::Broker;
use relaybus::client::{Client, ClientRole};
use relaybus::transport::serve;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

const MAX_FRAME: usize = 64 * 1024;

async fn start_broker() -> (Arc<Broker>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let broker = Arc::new(Broker::new());
    let server_broker = broker.clone();
    tokio::spawn(serve(listener, server_broker, MAX_FRAME));
    (broker, addr)
}

#[tokio::test]
async fn integration_weather_report_reaches_subscriber() {
    let (_broker, addr) = start_broker().await;

    let (publisher, _) = Client::connect(&addr, "P", ClientRole::Publisher, MAX_FRAME)
        .await
        .expect("publisher connect");
    let (subscriber, mut deliveries) =
        Client::connect(&addr, "S", ClientRole::Subscriber, MAX_FRAME)
            .await
            .expect("subscriber connect");
    assert_ne!(publisher.identity().id, subscriber.identity().id);

    let topic = publisher.create_topic("weather").await.unwrap();

    let topics = subscriber.list_topics().await.unwrap();
    assert_eq!(topics, vec![topic.clone()]);
    let topic_id = subscriber.find_topic_id("weather").expect("cached topic");
    assert!(subscriber.subscribe(topic_id).await.unwrap());

    assert!(publisher.publish(&topic, "sunny").await.unwrap());

    let message = timeout(Duration::from_secs(5), deliveries.recv())
        .await
        .expect("delivery in time")
        .expect("delivery channel open");
    assert_eq!(message.content, "sunny");
    assert_eq!(message.topic, topic);
    assert_eq!(message.publisher, *publisher.identity());
}

#[tokio::test]
async fn integration_publish_after_subscriber_leaves() {
    let (broker, addr) = start_broker().await;

    let (publisher, _) = Client::connect(&addr, "P", ClientRole::Publisher, MAX_FRAME)
        .await
        .unwrap();
    let (subscriber, _deliveries) = Client::connect(&addr, "S", ClientRole::Subscriber, MAX_FRAME)
        .await
        .unwrap();
    let subscriber_id = subscriber.identity().id;

    let topic = publisher.create_topic("weather").await.unwrap();
    assert!(subscriber.subscribe(topic.id).await.unwrap());
    assert!(broker.registry.subscribers_of(&topic.id).contains(&subscriber_id));

    subscriber.disconnect();

    timeout(Duration::from_secs(5), async {
        while broker.queues.contains(&subscriber_id) {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriber cleaned up");
    assert!(broker.registry.subscribers_of(&topic.id).is_empty());

    assert!(publisher.publish(&topic, "rain").await.unwrap());
    assert!(!broker.queues.contains(&subscriber_id));
}

#[tokio::test]
async fn integration_unknown_topic_is_reported() {
    let (_broker, addr) = start_broker().await;
    let (client, _) = Client::connect(&addr, "S", ClientRole::Subscriber, MAX_FRAME)
        .await
        .unwrap();

    assert!(client.list_topics().await.unwrap().is_empty());
    assert_eq!(client.find_topic_id("weather"), None);
    assert!(!client.subscribe(uuid::Uuid::new_v4()).await.unwrap());
}
