//! Per-tick systems run by the scheduler.

use std::fmt;

/// Per-frame tick function. Receives the frame delta in seconds.
pub type TickFn = Box<dyn FnMut(f64)>;

/// One-time start function, run before the first tick.
pub type StartFn = Box<dyn FnOnce()>;

/// A scheduler entry: a named behavior ticked once per frame.
pub struct System {
    /// System identifier.
    id: String,

    /// Disabled systems stay scheduled but are not ticked.
    enabled: bool,

    tick: TickFn,

    start: Option<StartFn>,
}

impl System {
    /// Creates a new enabled system.
    pub fn new(id: impl Into<String>, tick: impl FnMut(f64) + 'static) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            tick: Box::new(tick),
            start: None,
        }
    }

    /// Sets the one-time start function.
    pub fn with_start(mut self, start: impl FnOnce() + 'static) -> Self {
        self.start = Some(Box::new(start));
        self
    }

    /// Sets the initial enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the system ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true if the system is ticked during runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the enabled flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns true if the start function has not run yet.
    pub fn is_pending_start(&self) -> bool {
        self.start.is_some()
    }

    /// Runs the start function (at most once) and then the tick function.
    pub fn tick(&mut self, delta: f64) {
        if let Some(start) = self.start.take() {
            start();
        }
        (self.tick)(delta);
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("pending_start", &self.start.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_start_runs_once_before_first_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let start_log = Rc::clone(&log);
        let tick_log = Rc::clone(&log);

        let mut system = System::new("physics", move |dt| {
            tick_log.borrow_mut().push(format!("tick {dt}"))
        })
        .with_start(move || start_log.borrow_mut().push("start".to_string()));

        assert!(system.is_pending_start());
        system.tick(0.5);
        system.tick(0.25);
        assert!(!system.is_pending_start());

        assert_eq!(*log.borrow(), vec!["start", "tick 0.5", "tick 0.25"]);
    }

    #[test]
    fn test_enabled_flag() {
        let mut system = System::new("render", |_| {}).with_enabled(false);
        assert!(!system.is_enabled());
        system.set_enabled(true);
        assert!(system.is_enabled());
    }
}
