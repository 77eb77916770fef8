//! Event system
//!
//! - Handlers register per event kind and only see events of that kind
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Queuing support (immediate + deferred delivery)

use std::collections::HashMap;
use std::hash::Hash;

/// Events that can be routed by kind
pub trait EventKind {
    /// Discriminant used to route the event
    type Kind: Copy + Eq + Hash + std::fmt::Debug;

    /// Kind of this event
    fn kind(&self) -> Self::Kind;
}

/// Event handler trait
///
/// Returns true if the event was consumed (stops forwarding), false to allow
/// forwarding to handlers registered after this one.
pub trait EventHandler<E> {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &E) -> bool;
}

impl<E, F> EventHandler<E> for F
where
    F: FnMut(&E) -> bool,
{
    fn on_event(&mut self, event: &E) -> bool {
        self(event)
    }
}

/// Event system with registration and queuing
pub struct EventSystem<E: EventKind> {
    immediate_queue: Vec<E>,
    deferred_queue: Vec<(f64, E)>,
    handlers: HashMap<E::Kind, Vec<Box<dyn EventHandler<E>>>>,
    current_time: f64,
}

impl<E: EventKind> EventSystem<E> {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self {
            immediate_queue: Vec::new(),
            deferred_queue: Vec::new(),
            handlers: HashMap::new(),
            current_time: 0.0,
        }
    }

    /// Update current time (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Current time as last set by [`EventSystem::update_time`]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Register a handler for a specific event kind
    pub fn register_handler(&mut self, kind: E::Kind, handler: Box<dyn EventHandler<E>>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Number of handlers registered for a kind
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, event: E) {
        self.immediate_queue.push(event);
    }

    /// Queue an event for delivery once `delivery_time` is reached
    pub fn post(&mut self, delivery_time: f64, event: E) {
        // Keep the queue sorted by time; equal times keep posting order
        let index = self
            .deferred_queue
            .partition_point(|(time, _)| *time <= delivery_time);
        self.deferred_queue.insert(index, (delivery_time, event));
    }

    /// Dispatch all pending events
    ///
    /// Immediate events go first in the order they were sent, then every
    /// deferred event that is due, earliest first. Returns how many events
    /// were delivered.
    pub fn dispatch(&mut self) -> usize {
        let immediate = std::mem::take(&mut self.immediate_queue);
        let due = self
            .deferred_queue
            .partition_point(|(time, _)| *time <= self.current_time);
        let deferred: Vec<E> = self.deferred_queue.drain(..due).map(|(_, e)| e).collect();

        let count = immediate.len() + deferred.len();
        for event in immediate.iter().chain(deferred.iter()) {
            self.dispatch_event(event);
        }
        count
    }

    fn dispatch_event(&mut self, event: &E) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    log::trace!("Event {:?} consumed", event.kind());
                    break;
                }
            }
        }
    }

    /// Queued event counts as `(immediate, deferred)`
    pub fn pending(&self) -> (usize, usize) {
        (self.immediate_queue.len(), self.deferred_queue.len())
    }

    /// Clear all queued events (useful for state transitions)
    pub fn clear(&mut self) {
        self.immediate_queue.clear();
        self.deferred_queue.clear();
    }
}

impl<E: EventKind> Default for EventSystem<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Ping(u32),
        Pong,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Ping,
        Pong,
    }

    impl EventKind for TestEvent {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            match self {
                Self::Ping(_) => TestKind::Ping,
                Self::Pong => TestKind::Pong,
            }
        }
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str, consume: bool) -> Box<dyn EventHandler<TestEvent>> {
        let log = Rc::clone(log);
        Box::new(move |event: &TestEvent| {
            log.borrow_mut().push(format!("{tag}:{event:?}"));
            consume
        })
    }

    #[test]
    fn test_immediate_dispatch_only_reaches_matching_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = EventSystem::new();
        system.register_handler(TestKind::Ping, recorder(&log, "a", false));

        system.send(TestEvent::Ping(1));
        system.send(TestEvent::Pong);
        assert_eq!(system.dispatch(), 2);

        assert_eq!(*log.borrow(), vec!["a:Ping(1)".to_string()]);
    }

    #[test]
    fn test_deferred_dispatch_waits_for_time_and_orders() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = EventSystem::new();
        system.register_handler(TestKind::Ping, recorder(&log, "a", false));

        system.post(2.0, TestEvent::Ping(2));
        system.post(1.0, TestEvent::Ping(1));

        system.update_time(0.5);
        assert_eq!(system.dispatch(), 0);
        assert_eq!(system.pending(), (0, 2));

        system.update_time(2.0);
        system.dispatch();
        assert_eq!(*log.borrow(), vec!["a:Ping(1)".to_string(), "a:Ping(2)".to_string()]);
        assert_eq!(system.pending(), (0, 0));
    }

    #[test]
    fn test_event_consumption_stops_forwarding() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = EventSystem::new();
        system.register_handler(TestKind::Pong, recorder(&log, "first", true));
        system.register_handler(TestKind::Pong, recorder(&log, "second", false));

        system.send(TestEvent::Pong);
        system.dispatch();

        assert_eq!(*log.borrow(), vec!["first:Pong".to_string()]);
        assert_eq!(system.handler_count(TestKind::Pong), 2);
    }

    #[test]
    fn test_clear_drops_queued_events() {
        let mut system: EventSystem<TestEvent> = EventSystem::new();
        system.send(TestEvent::Pong);
        system.post(5.0, TestEvent::Ping(0));
        system.clear();
        assert_eq!(system.pending(), (0, 0));
    }
}
