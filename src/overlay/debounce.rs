//! Single-slot deadline used to coalesce saves

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// (Re)arm the slot; an earlier pending deadline is replaced
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop the pending deadline; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once when the deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn test_fires_once_after_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(start);

        assert!(!debouncer.poll(start + Duration::from_millis(99)));
        assert!(debouncer.poll(start + DELAY));
        assert!(!debouncer.poll(start + DELAY * 2));
    }

    #[test]
    fn test_reschedule_pushes_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(start);
        debouncer.schedule(start + Duration::from_millis(80));

        assert!(!debouncer.poll(start + Duration::from_millis(150)));
        assert!(debouncer.poll(start + Duration::from_millis(180)));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        assert!(!debouncer.cancel());
        debouncer.schedule(start);
        assert!(debouncer.cancel());
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(start + DELAY));
    }
}
