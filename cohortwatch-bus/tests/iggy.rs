//! Integration tests requiring a running Iggy server.
//!
//! Run with: cargo test -p cohortwatch-bus --test iggy -- --ignored
//!
//! The server address is taken from `COHORTWATCH_BUS_ADDRESS`
//! (default `127.0.0.1:8090`).

use std::time::Duration;

use cohortwatch_bus::{BusConfig, CohortName, Error, IggyTopicSource, TopicSource};

fn source() -> IggyTopicSource {
    let mut config = BusConfig::default().with_stream("cohortwatch-it");
    if let Ok(address) = std::env::var("COHORTWATCH_BUS_ADDRESS") {
        config = config.with_address(address);
    }
    IggyTopicSource::new(config)
}

fn unique_cohort(tag: &str) -> CohortName {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    CohortName::new(format!("{tag}-{nanos}")).unwrap()
}

#[tokio::test]
#[ignore]
async fn test_publish_then_poll_roundtrip() {
    let source = source();
    let topic = source.config().topics.topic_for(&unique_cohort("roundtrip"));

    source
        .publish(&topic, br#"{"type":"X"}"#.to_vec())
        .await
        .expect("publish");

    let mut consumer = source.open(&topic).await.expect("open");
    let mut received = Vec::new();
    for _ in 0..20 {
        received.extend(consumer.poll().await.expect("poll"));
        if !received.is_empty() {
            break;
        }
    }
    consumer.close().await.unwrap();

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].payload, br#"{"type":"X"}"#.to_vec());
}

#[tokio::test]
#[ignore]
async fn test_missing_topic_surfaces_on_poll() {
    let source = source();
    let topic = source.config().topics.topic_for(&unique_cohort("missing"));

    let mut consumer = source.open(&topic).await.expect("open succeeds");
    let result = tokio::time::timeout(Duration::from_secs(5), consumer.poll())
        .await
        .expect("poll returns");

    assert!(matches!(result, Err(Error::TopicNotFound { .. })));
    consumer.close().await.unwrap();
    consumer.close().await.unwrap();
}
