//! In-memory event bus.
//!
//! Delivers simulation events synchronously to registered handlers and keeps
//! every envelope for inspection. Intended for tests and single-process
//! embedding; it uses `.expect()` on lock operations and panics if a lock is
//! poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, SessionId};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

/// In-memory event bus.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let runner = SimulationRunner::new(catalog.clone(), catalog.clone(), catalog, config)
///     .with_publisher(bus.clone());
///
/// // ... play a session ...
///
/// assert!(bus.has_event("simulation.session_ended.v1"));
/// ```
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    published: RwLock<Vec<EventEnvelope>>,
    failing: AtomicBool,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent publish fail without storing the event.
    pub fn fail_publishes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns all published events in publish order.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .clone()
    }

    /// Returns events of a specific type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Returns events emitted by one session.
    pub fn events_for_session(&self, session_id: SessionId) -> Vec<EventEnvelope> {
        let id = session_id.to_string();
        self.published_events()
            .into_iter()
            .filter(|e| e.aggregate_id == id)
            .collect()
    }

    /// Event types in publish order.
    pub fn event_types(&self) -> Vec<String> {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.published
            .write()
            .expect("InMemoryEventBus: published write lock poisoned")
            .clear();
    }

    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .len()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .iter()
            .any(|e| e.event_type == event_type)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::PublishFailed,
                format!("bus rejected {}", event.event_type),
            ));
        }

        self.published
            .write()
            .expect("InMemoryEventBus: published write lock poisoned")
            .push(event.clone());

        // Clone handlers to release the lock before awaiting
        let type_handlers: Vec<Arc<dyn EventHandler>> = {
            let handlers = self
                .handlers
                .read()
                .expect("InMemoryEventBus: handlers lock poisoned");
            handlers
                .get(&event.event_type)
                .cloned()
                .unwrap_or_default()
        };

        let mut errors = Vec::new();
        for handler in type_handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::PublishFailed,
                format!("Handler errors: {}", errors.join(", ")),
            ));
        }

        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.subscribe_all(&[event_type], handler);
    }

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        let mut handlers = self
            .handlers
            .write()
            .expect("InMemoryEventBus: handlers write lock poisoned");
        for event_type in event_types {
            handlers
                .entry(event_type.to_string())
                .or_default()
                .push(Arc::clone(&handler));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn envelope(event_type: &str, session_id: SessionId) -> EventEnvelope {
        EventEnvelope::new(
            event_type,
            session_id.to_string(),
            "SimulationSession",
            json!({}),
        )
    }

    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingHandler {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: EventEnvelope) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DomainError::new(ErrorCode::InternalError, "boom"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    #[tokio::test]
    async fn publish_stores_event() {
        let bus = InMemoryEventBus::new();
        bus.publish(envelope("simulation.turn_resolved.v1", SessionId::new()))
            .await
            .unwrap();

        assert_eq!(bus.event_count(), 1);
        assert!(bus.has_event("simulation.turn_resolved.v1"));
    }

    #[tokio::test]
    async fn filters_by_type_and_session() {
        let bus = InMemoryEventBus::new();
        let a = SessionId::new();
        let b = SessionId::new();

        bus.publish_all(vec![
            envelope("simulation.session_started.v1", a),
            envelope("simulation.session_started.v1", b),
            envelope("simulation.turn_resolved.v1", a),
        ])
        .await
        .unwrap();

        assert_eq!(bus.events_of_type("simulation.session_started.v1").len(), 2);
        assert_eq!(bus.events_for_session(a).len(), 2);
        assert_eq!(
            bus.event_types(),
            vec![
                "simulation.session_started.v1",
                "simulation.session_started.v1",
                "simulation.turn_resolved.v1"
            ]
        );
    }

    #[tokio::test]
    async fn handlers_receive_matching_events_only() {
        let bus = InMemoryEventBus::new();
        let handler = CountingHandler::new(false);
        bus.subscribe("simulation.session_ended.v1", handler.clone());

        bus.publish(envelope("simulation.turn_resolved.v1", SessionId::new()))
            .await
            .unwrap();
        bus.publish(envelope("simulation.session_ended.v1", SessionId::new()))
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_error_is_reported_but_event_is_kept() {
        let bus = InMemoryEventBus::new();
        bus.subscribe_all(
            &["simulation.session_ended.v1"],
            CountingHandler::new(true),
        );

        let err = bus
            .publish(envelope("simulation.session_ended.v1", SessionId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PublishFailed);
        assert_eq!(bus.event_count(), 1);
    }

    #[tokio::test]
    async fn failing_bus_rejects_and_drops() {
        let bus = InMemoryEventBus::new();
        bus.fail_publishes(true);
        assert!(bus
            .publish(envelope("simulation.turn_resolved.v1", SessionId::new()))
            .await
            .is_err());
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn clear_removes_events() {
        let bus = InMemoryEventBus::new();
        bus.publish(envelope("x.v1", SessionId::new())).await.unwrap();
        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }
}
