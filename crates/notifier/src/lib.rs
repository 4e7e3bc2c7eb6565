//! Kafka publisher for order notifications.
//!
//! Serializes [`OrderEvent`]s to JSON and sends them to the order-events
//! topic, keyed by order id so all events for one order land on the same
//! partition. Delivery is at-most-once: a publish failure is logged and
//! swallowed, because the data mutation it announces already stands.

use std::time::Duration;

use anyhow::{Context, Result};
use app_config::AppConfig;
use async_trait::async_trait;
use model::OrderEvent;
use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use service::OrderEventSink;
use tracing::{error, info};

/// Publishes order lifecycle events to Kafka for dashboard subscribers.
pub struct KafkaOrderNotifier {
    producer: FutureProducer,
    topic: String,
}

impl KafkaOrderNotifier {
    /// Creates the producer from the loaded configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying Kafka client cannot be created.
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", cfg.kafka_brokers.join(","))
            .set("message.timeout.ms", "5000")
            .create()
            .context("Failed to create Kafka producer")?;

        info!(topic = %cfg.kafka_topic, "order event producer initialized");

        Ok(Self {
            producer,
            topic: cfg.kafka_topic.clone(),
        })
    }
}

#[async_trait]
impl OrderEventSink for KafkaOrderNotifier {
    async fn publish(&self, event: OrderEvent) {
        let key = event.order.id.to_string();
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, order_id = %key, "failed to serialize order event");
                return;
            }
        };

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);
        match self.producer.send(record, Duration::from_secs(5)).await {
            Ok(_) => {
                info!(order_id = %key, kind = ?event.kind, "order event published");
            }
            Err((e, _)) => {
                error!(error = %e, order_id = %key, "failed to publish order event");
            }
        }
    }
}
