use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// How long a notice stays visible.
pub const NOTICE_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Single-slot notice area. Posting replaces whatever is showing.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    current: Option<(Notice, DateTime<Utc>)>,
}

impl NotificationCenter {
    pub fn post(&mut self, notice: Notice, now: DateTime<Utc>) {
        self.current = Some((notice, now));
    }

    pub fn visible(&self, now: DateTime<Utc>) -> Option<&Notice> {
        let (notice, posted_at) = self.current.as_ref()?;
        (now - *posted_at < Duration::seconds(NOTICE_TTL_SECS)).then_some(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expires_after_three_seconds() {
        let t0 = Utc::now();
        let mut center = NotificationCenter::default();
        center.post(Notice::success("Form reset successfully!"), t0);
        assert!(center.visible(t0 + Duration::milliseconds(2900)).is_some());
        assert!(center.visible(t0 + Duration::seconds(3)).is_none());
    }

    #[test]
    fn test_new_notice_replaces_previous() {
        let t0 = Utc::now();
        let mut center = NotificationCenter::default();
        center.post(Notice::success("first"), t0);
        center.post(Notice::error("second"), t0 + Duration::seconds(1));
        let shown = center.visible(t0 + Duration::seconds(1)).unwrap();
        assert_eq!(shown.message, "second");
        assert_eq!(shown.severity, Severity::Error);
        // Visibility window restarts with the replacement.
        assert!(center.visible(t0 + Duration::milliseconds(3500)).is_some());
    }

    #[test]
    fn test_empty_center_shows_nothing() {
        assert!(NotificationCenter::default().visible(Utc::now()).is_none());
    }
}
