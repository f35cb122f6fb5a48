//! Per-extension view of the shared event bus.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tessera_core::{EventBus, Listener};

/// A subscription made through a scoped subscriber.
#[derive(Debug)]
struct Tracked {
    event: String,
    listener: Listener,
}

/// Links a caller's `once` callback to the wrapper actually on the bus.
#[derive(Debug)]
struct OnceBinding {
    serial: u64,
    event: String,
    original: Listener,
    wrapper: Listener,
}

#[derive(Debug, Default)]
struct ScopeState {
    tracked: Vec<Tracked>,
    once: Vec<OnceBinding>,
    next_serial: u64,
}

impl ScopeState {
    fn untrack(&mut self, event: &str, listener: &Listener) {
        if let Some(pos) = self
            .tracked
            .iter()
            .position(|t| t.event == event && t.listener.ptr_eq(listener))
        {
            self.tracked.remove(pos);
        }
    }
}

/// Tracks every subscription an extension makes so they can be removed as a batch.
///
/// Extensions never see the raw bus; all access goes through this wrapper,
/// which makes "who added this listener" recoverable without inspecting the
/// bus itself.
#[derive(Clone)]
pub struct ScopedSubscriber {
    bus: Rc<EventBus>,
    state: Rc<RefCell<ScopeState>>,
}

impl ScopedSubscriber {
    /// Creates a subscriber bound to the shared bus.
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self {
            bus,
            state: Rc::new(RefCell::new(ScopeState::default())),
        }
    }

    /// Subscribes a listener.
    pub fn on(&self, event: &str, listener: Listener) {
        self.bus.on(event, listener.clone());
        self.state.borrow_mut().tracked.push(Tracked {
            event: event.to_string(),
            listener,
        });
    }

    /// Subscribes a listener that fires at most once.
    ///
    /// The bus holds an internal wrapper. When it fires, the wrapper first
    /// removes itself from the bus and from this subscriber's bookkeeping,
    /// then invokes `listener`. Pass the original `listener` to [`off`] to
    /// cancel before it fires.
    ///
    /// [`off`]: ScopedSubscriber::off
    pub fn once(&self, event: &str, listener: Listener) {
        let serial = {
            let mut state = self.state.borrow_mut();
            state.next_serial += 1;
            state.next_serial
        };

        let weak_state: Weak<RefCell<ScopeState>> = Rc::downgrade(&self.state);
        let weak_bus: Weak<EventBus> = Rc::downgrade(&self.bus);
        let callback = listener.clone();

        let wrapper = Listener::new(move |args: &[Value]| {
            let (Some(state), Some(bus)) = (weak_state.upgrade(), weak_bus.upgrade()) else {
                return;
            };

            let binding = {
                let mut state = state.borrow_mut();
                let Some(pos) = state.once.iter().position(|b| b.serial == serial) else {
                    // Already fired or unsubscribed
                    return;
                };
                let binding = state.once.remove(pos);
                state.untrack(&binding.event, &binding.wrapper);
                binding
            };
            bus.off(&binding.event, &binding.wrapper);

            callback.call(args);
        });

        self.bus.on(event, wrapper.clone());
        let mut state = self.state.borrow_mut();
        state.tracked.push(Tracked {
            event: event.to_string(),
            listener: wrapper.clone(),
        });
        state.once.push(OnceBinding {
            serial,
            event: event.to_string(),
            original: listener,
            wrapper,
        });
    }

    /// Removes one subscription of `listener` for `event`.
    ///
    /// A listener registered with [`once`] is resolved to its wrapper first.
    /// Returns true if a subscription was removed.
    ///
    /// [`once`]: ScopedSubscriber::once
    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        let actual = {
            let mut state = self.state.borrow_mut();
            let bound = state
                .once
                .iter()
                .position(|b| b.event == event && b.original.ptr_eq(listener));

            let actual = match bound {
                Some(pos) => state.once.remove(pos).wrapper,
                None => listener.clone(),
            };

            let tracked = state
                .tracked
                .iter()
                .any(|t| t.event == event && t.listener.ptr_eq(&actual));
            if !tracked {
                return false;
            }
            state.untrack(event, &actual);
            actual
        };

        self.bus.off(event, &actual);
        true
    }

    /// Removes every subscription this subscriber holds for `event`.
    ///
    /// Returns the number of subscriptions removed.
    pub fn off_event(&self, event: &str) -> usize {
        let removed = {
            let mut state = self.state.borrow_mut();
            let mut removed = Vec::new();
            for i in (0..state.tracked.len()).rev() {
                if state.tracked[i].event == event {
                    removed.push(state.tracked.remove(i).listener);
                }
            }
            state.once.retain(|b| b.event != event);
            removed
        };

        for listener in &removed {
            self.bus.off(event, listener);
        }
        removed.len()
    }

    /// Publishes an event on the shared bus.
    pub fn emit(&self, event: &str, args: &[Value]) -> usize {
        self.bus.emit(event, args)
    }

    /// Removes every subscription made through this subscriber.
    ///
    /// Safe to call repeatedly.
    pub fn remove_all(&self) -> usize {
        let tracked = {
            let mut state = self.state.borrow_mut();
            state.once.clear();
            std::mem::take(&mut state.tracked)
        };

        for t in &tracked {
            self.bus.off(&t.event, &t.listener);
        }
        tracked.len()
    }

    /// Returns the number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.borrow().tracked.len()
    }
}

impl std::fmt::Debug for ScopedSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedSubscriber")
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<usize>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        (count, Listener::new(move |_| inner.set(inner.get() + 1)))
    }

    #[test]
    fn test_on_tracks_subscriptions() {
        let bus = Rc::new(EventBus::new());
        let scope = ScopedSubscriber::new(Rc::clone(&bus));
        let (count, listener) = counter();

        scope.on("spawn", listener);
        assert_eq!(scope.subscription_count(), 1);
        assert_eq!(bus.listener_count("spawn"), 1);

        scope.emit("spawn", &[]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_once_fires_exactly_once() {
        let bus = Rc::new(EventBus::new());
        let scope = ScopedSubscriber::new(Rc::clone(&bus));
        let (count, listener) = counter();

        scope.once("wave_start", listener);
        assert_eq!(scope.subscription_count(), 1);

        bus.emit("wave_start", &[]);
        assert_eq!(scope.subscription_count(), 0);
        bus.emit("wave_start", &[]);

        assert_eq!(count.get(), 1);
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn test_once_receives_arguments() {
        let bus = Rc::new(EventBus::new());
        let scope = ScopedSubscriber::new(Rc::clone(&bus));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        scope.once("loot", Listener::new(move |args| sink.borrow_mut().extend_from_slice(args)));
        bus.emit("loot", &[Value::from("gem")]);

        assert_eq!(*seen.borrow(), vec![Value::from("gem")]);
    }

    #[test]
    fn test_once_cleans_up_when_callback_panics() {
        let bus = Rc::new(EventBus::new());
        let scope = ScopedSubscriber::new(Rc::clone(&bus));

        scope.once("boss", Listener::new(|_| panic!("boss script crashed")));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bus.emit("boss", &[]);
        }));

        assert!(result.is_err());
        assert_eq!(scope.subscription_count(), 0);
        assert_eq!(bus.total_listeners(), 0);
        assert_eq!(bus.emit("boss", &[]), 0);
    }

    #[test]
    fn test_off_with_original_once_callback() {
        let bus = Rc::new(EventBus::new());
        let scope = ScopedSubscriber::new(Rc::clone(&bus));
        let (count, listener) = counter();

        scope.once("boss", listener.clone());
        assert!(scope.off("boss", &listener));
        assert!(!scope.off("boss", &listener));

        bus.emit("boss", &[]);
        assert_eq!(count.get(), 0);
        assert_eq!(bus.total_listeners(), 0);
        assert_eq!(scope.subscription_count(), 0);
    }

    #[test]
    fn test_off_event_removes_all_for_event() {
        let bus = Rc::new(EventBus::new());
        let scope = ScopedSubscriber::new(Rc::clone(&bus));
        let (count, listener) = counter();

        scope.on("hit", listener.clone());
        scope.once("hit", listener.clone());
        scope.on("miss", listener);

        assert_eq!(scope.off_event("hit"), 2);
        bus.emit("hit", &[]);

        assert_eq!(count.get(), 0);
        assert_eq!(scope.subscription_count(), 1);
        assert_eq!(bus.listener_count("miss"), 1);
    }

    #[test]
    fn test_remove_all_leaves_foreign_listeners() {
        let bus = Rc::new(EventBus::new());
        let scope = ScopedSubscriber::new(Rc::clone(&bus));
        let (_, foreign) = counter();
        bus.on("tick", foreign.clone());

        let (_, listener) = counter();
        scope.on("tick", listener.clone());
        scope.once("tick", listener.clone());
        scope.once("spawn", listener);
        bus.emit("spawn", &[]);

        assert_eq!(scope.remove_all(), 2);
        assert_eq!(scope.remove_all(), 0);
        assert_eq!(bus.total_listeners(), 1);
        assert!(bus.has_listener("tick", &foreign));
    }

    #[test]
    fn test_scopes_are_independent() {
        let bus = Rc::new(EventBus::new());
        let first = ScopedSubscriber::new(Rc::clone(&bus));
        let second = ScopedSubscriber::new(Rc::clone(&bus));
        let (_, listener) = counter();

        first.on("tick", listener.clone());
        second.on("tick", listener.clone());

        assert!(!second.off("other", &listener));
        first.remove_all();

        assert_eq!(bus.listener_count("tick"), 1);
        assert_eq!(second.subscription_count(), 1);
    }
}
