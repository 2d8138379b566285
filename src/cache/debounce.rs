use std::time::Duration;

use tokio::time::Instant;

/// Debounce timer for search keystrokes.
///
/// Each keystroke replaces the pending query and pushes the deadline
/// out by the full window; only the last query within a quiescent
/// window ever fires. Time is passed in explicitly so the policy is
/// testable without sleeping.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    query: String,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            query: String::new(),
            deadline: None,
        }
    }

    /// Record a keystroke. An empty query cancels any pending dispatch.
    pub fn press(&mut self, query: &str, now: Instant) {
        self.query = query.to_string();
        self.deadline = if query.is_empty() {
            None
        } else {
            Some(now + self.window)
        };
    }

    /// Deadline of the pending dispatch, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire the pending dispatch if the window has quiesced. Returns
    /// the query to dispatch at most once per scheduled deadline.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(self.query.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn test_keystrokes_within_window_fire_once_with_last_query() {
        let mut debounce = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        debounce.press("a", t0);
        debounce.press("ab", t0 + Duration::from_millis(100));
        debounce.press("abc", t0 + Duration::from_millis(200));

        let mut fired = Vec::new();
        // Sample well past every intermediate deadline
        for ms in [300, 400, 500, 600, 700, 800, 900] {
            if let Some(q) = debounce.fire(t0 + Duration::from_millis(ms)) {
                fired.push(q);
            }
        }
        assert_eq!(fired, vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_each_keystroke_resets_the_window() {
        let mut debounce = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        debounce.press("ra", t0);
        // Not yet quiescent at t0+400
        assert_eq!(debounce.fire(t0 + Duration::from_millis(400)), None);
        debounce.press("rak", t0 + Duration::from_millis(400));
        // Old deadline (t0+500) must not fire after the reset
        assert_eq!(debounce.fire(t0 + Duration::from_millis(600)), None);
        assert_eq!(
            debounce.fire(t0 + Duration::from_millis(900)),
            Some("rak".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_query_cancels_pending_dispatch() {
        let mut debounce = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        debounce.press("rakoto", t0);
        debounce.press("", t0 + Duration::from_millis(100));
        assert_eq!(debounce.deadline(), None);
        assert_eq!(debounce.fire(t0 + Duration::from_millis(1000)), None);
    }
}
