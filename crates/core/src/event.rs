//! Process-wide publish/subscribe bus.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// A callback registered on the bus.
///
/// Listeners are compared by identity: two clones of the same `Listener`
/// are equal, two listeners wrapping identical closures are not.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&[Value])>);

impl Listener {
    /// Wraps a callback.
    pub fn new(callback: impl Fn(&[Value]) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Returns true if both handles point to the same callback.
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Invokes the callback.
    pub fn call(&self, args: &[Value]) {
        (self.0)(args)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

/// Shared event bus keyed by event name.
///
/// The bus uses interior mutability so listeners may subscribe or
/// unsubscribe while an event is being emitted. Emission works on a snapshot
/// of the listener list taken when `emit` starts.
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a listener to an event.
    pub fn on(&self, event: &str, listener: Listener) {
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Removes one registration of the listener. Returns true if it was found.
    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };

        let Some(pos) = list.iter().position(|l| l.ptr_eq(listener)) else {
            return false;
        };

        list.remove(pos);
        if list.is_empty() {
            listeners.remove(event);
        }
        true
    }

    /// Emits an event, returning the number of listeners invoked.
    pub fn emit(&self, event: &str, args: &[Value]) -> usize {
        let snapshot = match self.listeners.borrow().get(event) {
            Some(list) => list.clone(),
            None => return 0,
        };

        tracing::trace!(event, listeners = snapshot.len(), "emitting event");

        for listener in &snapshot {
            listener.call(args);
        }
        snapshot.len()
    }

    /// Returns the number of listeners subscribed to an event.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    /// Returns the number of listeners across all events.
    pub fn total_listeners(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }

    /// Returns true if the listener is subscribed to the event.
    pub fn has_listener(&self, event: &str, listener: &Listener) -> bool {
        self.listeners
            .borrow()
            .get(event)
            .is_some_and(|list| list.iter().any(|l| l.ptr_eq(listener)))
    }

    /// Returns the names of events with at least one listener, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listeners.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.event_names())
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_listener(count: &Rc<Cell<usize>>) -> Listener {
        let count = Rc::clone(count);
        Listener::new(move |_| count.set(count.get() + 1))
    }

    #[test]
    fn test_emit_invokes_listeners() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        bus.on("hit", counting_listener(&count));
        bus.on("hit", counting_listener(&count));

        assert_eq!(bus.emit("hit", &[Value::from(3)]), 2);
        assert_eq!(bus.emit("miss", &[]), 0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_emit_passes_arguments() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.on("damage", Listener::new(move |args| sink.borrow_mut().extend_from_slice(args)));

        bus.emit("damage", &[Value::from("goblin"), Value::from(7)]);

        assert_eq!(*seen.borrow(), vec![Value::from("goblin"), Value::from(7)]);
    }

    #[test]
    fn test_off_by_identity() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let a = counting_listener(&count);
        let b = counting_listener(&count);
        bus.on("tick", a.clone());
        bus.on("tick", b.clone());

        assert!(bus.off("tick", &a));
        assert!(!bus.off("tick", &a));
        assert!(bus.has_listener("tick", &b));
        assert_eq!(bus.listener_count("tick"), 1);

        assert!(bus.off("tick", &b));
        assert!(bus.event_names().is_empty());
    }

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        let bus = Rc::new(EventBus::new());
        let slot: Rc<RefCell<Option<Listener>>> = Rc::new(RefCell::new(None));

        let bus_ref = Rc::clone(&bus);
        let slot_ref = Rc::clone(&slot);
        let listener = Listener::new(move |_| {
            if let Some(me) = slot_ref.borrow().as_ref() {
                bus_ref.off("once", me);
            }
        });
        *slot.borrow_mut() = Some(listener.clone());
        bus.on("once", listener);

        assert_eq!(bus.emit("once", &[]), 1);
        assert_eq!(bus.emit("once", &[]), 0);
        assert_eq!(bus.total_listeners(), 0);
    }
}
