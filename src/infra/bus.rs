use {
    crate::domain::{effects::RealtimeBus, error::NotifyError},
    async_trait::async_trait,
    serde_json::Value,
    tokio::sync::broadcast,
};

/// One published event as seen by subscribers.
#[derive(Debug, Clone)]
pub struct BusEvent {
    pub topic: String,
    pub payload: Value,
}

/// In-process publish/subscribe bus. The websocket layer subscribes and
/// forwards events to the owning merchant's connected sessions. Delivery is
/// at-least-once for live subscribers and unordered across topics; a send
/// with nobody listening is not a failure.
#[derive(Clone)]
pub struct LocalBus {
    tx: broadcast::Sender<BusEvent>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl RealtimeBus for LocalBus {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), NotifyError> {
        let _ = self.tx.send(BusEvent {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
