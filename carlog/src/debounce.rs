use time::{Duration, OffsetDateTime};

/// Deadline-based debouncer: every trigger pushes the deadline out by the
/// window, and it fires once the clock passes the deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<OffsetDateTime>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn trigger(&mut self, now: OffsetDateTime) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true (and disarms) once the deadline has passed.
    pub fn fire_if_due(&mut self, now: OffsetDateTime) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
