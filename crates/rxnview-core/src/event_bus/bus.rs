//! Synchronous fan-out of canvas events to observers on the UI thread.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use super::events::{CanvasEvent, EventCategory};

/// Returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.0.simple().to_string();
        write!(f, "sub-{}", &text[..8])
    }
}

/// Which events a subscriber receives.
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Everything.
    #[default]
    All,
    /// Events whose category is listed.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &CanvasEvent) -> bool {
        let EventFilter::Categories(wanted) = self else {
            return true;
        };
        wanted.contains(&event.category())
    }
}

type Handler = Box<dyn Fn(CanvasEvent) + Send + Sync>;
type Registry = HashMap<SubscriptionId, (EventFilter, Handler)>;

/// History settings of an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Record published events.
    pub enable_history: bool,
    /// Oldest events are dropped beyond this many.
    pub max_history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            enable_history: false,
            max_history_size: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    #[error("no subscriber registered for canvas events")]
    NoSubscribers,
}

/// Delivers [`CanvasEvent`]s from the interaction controller to whoever
/// listens: property forms, undo stacks, redraw scheduling.
///
/// Handlers run on the publishing thread while the registry is read-locked,
/// so a handler must not subscribe or unsubscribe.
pub struct EventBus {
    handlers: Arc<RwLock<Registry>>,
    history: Arc<RwLock<VecDeque<CanvasEvent>>>,
    config: EventBusConfig,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            handlers: Arc::default(),
            history: Arc::new(RwLock::new(VecDeque::with_capacity(config.max_history_size))),
            config,
        }
    }

    /// Hands `event` to every subscriber whose filter accepts it.
    ///
    /// # Returns
    ///
    /// How many handlers ran. `NoSubscribers` when the registry is empty.
    pub fn publish(&self, event: CanvasEvent) -> Result<usize, EventBusError> {
        if self.config.enable_history {
            self.add_to_history(&event);
        }

        let registry = self.handlers.read();
        if registry.is_empty() {
            return Err(EventBusError::NoSubscribers);
        }

        let mut delivered = 0;
        for (_, handler) in registry.values().filter(|(f, _)| f.matches(&event)) {
            handler(event.clone());
            delivered += 1;
        }
        tracing::trace!("{} delivered to {} handler(s)", event.description(), delivered);
        Ok(delivered)
    }

    /// Registers `handler` for the events `filter` accepts.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(CanvasEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Event subscriber {} registered", id);
        id
    }

    /// Returns false for an unknown or already removed id.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.handlers.write().remove(&id) {
            Some(_) => {
                tracing::debug!("Event subscriber {} dropped", id);
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Recent events, oldest first (empty unless history is enabled)
    pub fn history(&self) -> Vec<CanvasEvent> {
        self.history.read().iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    fn add_to_history(&self, event: &CanvasEvent) {
        let cap = self.config.max_history_size;
        let mut log = self.history.write();
        if cap == 0 {
            return;
        }
        if log.len() == cap {
            log.pop_front();
        }
        log.push_back(event.clone());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.subscriber_count())
            .field("history", &self.history.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(
            bus.publish(CanvasEvent::RedrawRequested),
            Err(EventBusError::NoSubscribers)
        );
    }

    #[test]
    fn test_unsubscribe_once() {
        let bus = EventBus::new();
        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_category_filter() {
        let bus = EventBus::new();
        let selection = Arc::new(AtomicUsize::new(0));
        let all = Arc::new(AtomicUsize::new(0));

        let s = selection.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Selection]),
            move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            },
        );
        let a = all.clone();
        bus.subscribe(EventFilter::All, move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });

        let delivered = bus
            .publish(CanvasEvent::ElementsMoved {
                ids: vec![ElementId(1)],
            })
            .unwrap();
        assert_eq!(delivered, 1);

        bus.publish(CanvasEvent::SelectionChanged { selected: vec![] })
            .unwrap();

        assert_eq!(selection.load(Ordering::SeqCst), 1);
        assert_eq!(all.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = EventBus::with_config(EventBusConfig {
            enable_history: true,
            max_history_size: 2,
        });
        for i in 0..3 {
            let _ = bus.publish(CanvasEvent::ElementsRemoved {
                ids: vec![ElementId(i)],
            });
        }
        let history = bus.history();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0],
            CanvasEvent::ElementsRemoved {
                ids: vec![ElementId(1)]
            }
        );

        bus.clear_history();
        assert!(bus.history().is_empty());
    }
}
