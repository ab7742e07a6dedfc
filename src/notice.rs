use std::time::Duration;

use crate::interaction::InteractError;

/// A transient failure message shown above the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub error: InteractError,
    pub remaining: Duration,
}

impl Notice {
    pub fn new(error: InteractError, lifetime: Duration) -> Self {
        Self {
            error,
            remaining: lifetime,
        }
    }

    /// Count down; returns `true` once the notice has expired.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.remaining.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expires() {
        let mut notice = Notice::new(InteractError::HandsFull, Duration::from_millis(2000));
        assert!(!notice.tick(Duration::from_millis(1950)));
        assert_eq!(notice.remaining, Duration::from_millis(50));
        assert!(notice.tick(Duration::from_millis(50)));
    }
}
