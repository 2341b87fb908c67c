//! Unit tests for the push hub

use macrofeed::core::push::{PushHub, MARKET_UPDATE_CHANNEL};
use serde_json::{json, Value};

#[test]
fn publish_without_subscribers_reaches_nobody() {
    tokio_test::block_on(async {
        let hub = PushHub::new();
        let delivered = hub.publish(MARKET_UPDATE_CHANNEL, &json!({"x": 1}));
        assert_eq!(delivered, 0);
    });
}

#[tokio::test]
async fn subscribers_receive_the_channel_envelope() {
    let hub = PushHub::new();
    let mut rx = hub.subscribe();

    let delivered = hub.publish(MARKET_UPDATE_CHANNEL, &json!({"price": 450.0}));
    assert_eq!(delivered, 1);

    let message: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(message["channel"], MARKET_UPDATE_CHANNEL);
    assert_eq!(message["data"]["price"], 450.0);
}

#[tokio::test]
async fn every_subscriber_gets_every_message() {
    let hub = PushHub::new();
    let mut a = hub.subscribe();
    let mut b = hub.subscribe();
    assert_eq!(hub.subscriber_count(), 2);

    let delivered = hub.publish(MARKET_UPDATE_CHANNEL, &json!({"n": 1}));
    assert_eq!(delivered, 2);
    assert!(a.recv().await.is_ok());
    assert!(b.recv().await.is_ok());
}
