//! [`RecordingSink`]: keeps every emitted event for later assertions.

use std::sync::Mutex;

use pack_script::{Event, EventKind, EventSink, Status};

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Events of one kind.
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| event.kind == kind)
            .collect()
    }

    /// Every `SYS-ERROR` event.
    pub fn errors(&self) -> Vec<Event> {
        self.of_kind(EventKind::SysError)
    }

    /// Status sub-kinds in emission order.
    pub fn statuses(&self) -> Vec<Status> {
        self.events().iter().filter_map(|event| event.status).collect()
    }

    /// Text of every event of `kind`, in emission order.
    pub fn messages(&self, kind: EventKind) -> Vec<String> {
        self.of_kind(kind).iter().map(Event::text).collect()
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.statuses().contains(&status)
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}
