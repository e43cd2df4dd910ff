use std::time::{Duration, Instant};

/// How long a banner stays visible before it clears itself.
pub const STATUS_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

/// Transient status line. The last write wins: every `set` replaces both the
/// message and its expiry.
#[derive(Debug, Default)]
pub struct StatusBanner {
    current: Option<(Status, Option<Instant>)>,
}

impl StatusBanner {
    pub fn set(&mut self, level: StatusLevel, message: impl Into<String>, now: Instant) {
        let status = Status {
            level,
            message: message.into(),
        };
        self.current = Some((status, Some(now + STATUS_DURATION)));
    }

    /// Shown until replaced or cleared.
    pub fn set_sticky(&mut self, level: StatusLevel, message: impl Into<String>) {
        let status = Status {
            level,
            message: message.into(),
        };
        self.current = Some((status, None));
    }

    /// Drops the banner once its deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some((_, Some(deadline))) = &self.current {
            if now >= *deadline {
                self.current = None;
            }
        }
    }

    pub fn current(&self) -> Option<&Status> {
        self.current.as_ref().map(|(status, _)| status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_expires_after_the_status_duration() {
        let start = Instant::now();
        let mut banner = StatusBanner::default();
        banner.set(StatusLevel::Warning, "missing ids", start);

        banner.tick(start + STATUS_DURATION / 2);
        assert_eq!(banner.current().map(|s| s.level), Some(StatusLevel::Warning));

        banner.tick(start + STATUS_DURATION);
        assert!(banner.current().is_none());
    }

    #[test]
    fn last_write_wins() {
        let start = Instant::now();
        let mut banner = StatusBanner::default();
        banner.set(StatusLevel::Error, "first", start);
        banner.set(StatusLevel::Success, "second", start + Duration::from_secs(2));

        banner.tick(start + STATUS_DURATION);
        let status = banner.current().cloned();
        assert_eq!(
            status,
            Some(Status {
                level: StatusLevel::Success,
                message: "second".to_string()
            })
        );
    }

    #[test]
    fn sticky_banner_survives_ticks_until_replaced() {
        let start = Instant::now();
        let mut banner = StatusBanner::default();
        banner.set_sticky(StatusLevel::Info, "sending");
        banner.tick(start + STATUS_DURATION * 10);
        assert!(banner.current().is_some());

        let later = start + STATUS_DURATION * 10;
        banner.set(StatusLevel::Success, "sent", later);
        banner.tick(later + STATUS_DURATION);
        assert!(banner.current().is_none());
    }
}
