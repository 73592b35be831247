//! User-facing notices for sync outcomes.
//!
//! Every call to
//! [`CalendarSync::add_event_with_feedback`](crate::CalendarSync::add_event_with_feedback)
//! ends with exactly one [`Notice`], built from the outcome and a
//! [`MessageBundle`] of localized strings, and handed to a [`Notifier`]:
//!
//! - [`LogNotifier`] writes the notice through `tracing`.
//! - [`DesktopNotifier`] shows a desktop notification via `notify-rust`.
//! - [`MemoryNotifier`] keeps notices for inspection.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use notify_rust::Notification;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::Platform;
use crate::orchestrator::SyncOutcome;

/// Localized strings used to build notices.
///
/// Optional entries fall back to English text when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageBundle {
    /// Title shown after an entry was added.
    pub added_to_calendar: String,
    /// Short text for a refused permission; the permission notice body when
    /// `calendar_permission_message` is blank.
    pub calendar_permission_denied: String,
    /// Title shown when adding failed.
    pub calendar_error: String,
    /// Title of the permission prompt.
    pub calendar_permission_title: String,
    /// Body of the permission prompt.
    pub calendar_permission_message: String,
    /// Title shown when the event is already in the calendar.
    pub event_already_exists: Option<String>,
    /// Body shown when the event is already in the calendar; `This event` is
    /// replaced by the quoted event name.
    pub event_already_exists_message: Option<String>,
    /// Title shown when no calendar is available.
    pub calendar_setup_title: Option<String>,
    /// Body shown when no calendar is available; defaults per platform.
    pub calendar_setup_message: Option<String>,
}

impl Default for MessageBundle {
    fn default() -> Self {
        Self {
            added_to_calendar: "Added to Calendar".to_string(),
            calendar_permission_denied: "Calendar permission denied".to_string(),
            calendar_error: "Calendar Error".to_string(),
            calendar_permission_title: "Calendar Permission Required".to_string(),
            calendar_permission_message:
                "Please allow calendar access in Settings to add events to your calendar."
                    .to_string(),
            event_already_exists: None,
            event_already_exists_message: None,
            calendar_setup_title: None,
            calendar_setup_message: None,
        }
    }
}

impl MessageBundle {
    fn permission_message(&self) -> &str {
        if self.calendar_permission_message.trim().is_empty() {
            &self.calendar_permission_denied
        } else {
            &self.calendar_permission_message
        }
    }

    fn already_exists_title(&self) -> &str {
        self.event_already_exists
            .as_deref()
            .unwrap_or("Event Already in Calendar")
    }

    fn already_exists_message(&self) -> &str {
        self.event_already_exists_message
            .as_deref()
            .unwrap_or("This event is already in your calendar.")
    }

    fn setup_title(&self) -> &str {
        self.calendar_setup_title
            .as_deref()
            .unwrap_or("Calendar Setup Required")
    }

    fn setup_message(&self, platform: Platform) -> &str {
        if let Some(message) = self.calendar_setup_message.as_deref() {
            return message;
        }
        match platform {
            Platform::Ios => {
                "No calendars are configured on your device. Please set up at least one calendar in your device Settings > Calendar & Accounts."
            }
            Platform::Android => {
                "No calendars are available. Please set up a Google account or local calendar in your device settings."
            }
        }
    }
}

/// What a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Added,
    AlreadyExists,
    PermissionRequired,
    SetupRequired,
    Error,
}

/// A button offered with a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeAction {
    Ok,
    Great,
    Cancel,
    OpenSettings,
}

impl NoticeAction {
    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Great => "Great!",
            Self::Cancel => "Cancel",
            Self::OpenSettings => "Settings",
        }
    }
}

/// A user-facing message describing one sync outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
    pub actions: Vec<NoticeAction>,
}

impl Notice {
    /// Builds the notice for `outcome` of adding the event named `event_name`.
    pub fn for_outcome(
        outcome: &SyncOutcome,
        event_name: &str,
        bundle: &MessageBundle,
        platform: Platform,
    ) -> Self {
        match outcome {
            SyncOutcome::Added { .. } => Self {
                kind: NoticeKind::Added,
                title: format!("📅 {}", bundle.added_to_calendar),
                body: format!("\"{}\" has been successfully added to your calendar!", event_name),
                actions: vec![NoticeAction::Great],
            },
            SyncOutcome::AlreadyExists { .. } => Self {
                kind: NoticeKind::AlreadyExists,
                title: format!("📅 {}", bundle.already_exists_title()),
                body: bundle
                    .already_exists_message()
                    .replacen("This event", &format!("\"{}\"", event_name), 1),
                actions: vec![NoticeAction::Ok],
            },
            SyncOutcome::PermissionDenied => Self {
                kind: NoticeKind::PermissionRequired,
                title: format!("🔒 {}", bundle.calendar_permission_title),
                body: bundle.permission_message().to_string(),
                actions: vec![NoticeAction::Cancel, NoticeAction::OpenSettings],
            },
            SyncOutcome::NoCalendarAvailable => Self {
                kind: NoticeKind::SetupRequired,
                title: format!("📅 {}", bundle.setup_title()),
                body: bundle.setup_message(platform).to_string(),
                actions: vec![NoticeAction::Cancel, NoticeAction::OpenSettings],
            },
            SyncOutcome::WriteFailed { reason } => Self {
                kind: NoticeKind::Error,
                title: format!("❌ {}", bundle.calendar_error),
                body: format!(
                    "Sorry, we couldn't add this event to your calendar.\n\nError: {}",
                    reason
                ),
                actions: vec![NoticeAction::Ok],
            },
        }
    }

    /// Returns true if the notice reports a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::PermissionRequired | NoticeKind::SetupRequired | NoticeKind::Error
        )
    }
}

/// Delivers notices to the user.
pub trait Notifier: Send + Sync {
    /// Shows or records a notice.
    fn notify(&self, notice: &Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        if notice.is_failure() {
            warn!(kind = ?notice.kind, title = %notice.title, body = %notice.body, "Calendar notice");
        } else {
            info!(kind = ?notice.kind, title = %notice.title, body = %notice.body, "Calendar notice");
        }
    }
}

/// Shows notices as desktop notifications.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
    timeout: Duration,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            app_name: "calsync".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl DesktopNotifier {
    /// Creates a notifier with the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Builder: set how long notifications stay visible.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: &Notice) {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(&notice.title)
            .body(&notice.body)
            .timeout(self.timeout);

        match notification.show() {
            Ok(_) => info!(kind = ?notice.kind, title = %notice.title, "Notification sent"),
            Err(e) => error!(error = %e, title = %notice.title, "Failed to send notification"),
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}
