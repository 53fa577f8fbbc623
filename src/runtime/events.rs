//! # Lifecycle Events
//!
//! The ordered trace of initializations and deinitializations a scenario produced.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Initialized,
    Deinitialized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    #[serde(rename = "eventKind")]
    pub kind: EventKind,
    pub label: String,
}

impl Event {
    pub fn initialized(label: impl Into<String>) -> Self {
        Event { kind: EventKind::Initialized, label: label.into() }
    }

    pub fn deinitialized(label: impl Into<String>) -> Self {
        Event { kind: EventKind::Deinitialized, label: label.into() }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Initialized => write!(f, "{} is being initialized", self.label),
            EventKind::Deinitialized => write!(f, "{} is being deinitialized", self.label),
        }
    }
}

/// Callback invoked once per recorded event, in order.
pub type Observer = Box<dyn FnMut(&Event)>;

#[derive(Default)]
pub struct EventLog {
    events: Vec<Event>,
    observers: Vec<Observer>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn record(&mut self, event: Event) {
        for observer in &mut self.observers {
            observer(&event);
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.events)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(Event::deinitialized("Dev 1")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "eventKind": "deinitialized", "label": "Dev 1" })
        );
    }

    #[test]
    fn test_observers_see_every_event_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut log = EventLog::new();
        log.subscribe(Box::new(move |event: &Event| sink.borrow_mut().push(event.to_string())));
        log.record(Event::initialized("Swift"));
        log.record(Event::deinitialized("Swift"));

        assert_eq!(
            *seen.borrow(),
            vec!["Swift is being initialized", "Swift is being deinitialized"]
        );
        assert_eq!(log.count(EventKind::Deinitialized), 1);
    }
}
