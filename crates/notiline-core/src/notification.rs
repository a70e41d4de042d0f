//! Notification domain entities and value objects.

use std::fmt;
use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Timeout applied when a producer asks for "the server default".
pub const DEFAULT_TIMEOUT_SECS: u32 = 15;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Identifier of a notification held by the store.
///
/// Always positive: on the wire `0` means "no id / create a new one", so it
/// can never name a stored notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(NonZeroU32);

impl NotificationId {
    /// Creates an id, returning `None` for zero.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Returns the raw wire value.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for NotificationId {
    type Error = DomainError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(DomainError::ZeroId)
    }
}

impl From<NotificationId> for u32 {
    fn from(id: NotificationId) -> Self {
        id.get()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Expiration Policy
// ============================================================================

/// How long a notification stays on the status line once shown.
///
/// Mirrors the signed `expire_timeout` of the create event:
/// `0` is permanent, negative asks for the default, positive is seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirePolicy {
    /// Never expires; leaves the display only when hidden or dismissed.
    Permanent,
    /// Use the daemon's configured default.
    #[default]
    Default,
    /// Expires after the given number of seconds.
    After(NonZeroU32),
}

impl ExpirePolicy {
    /// Interprets a raw `expire_timeout` value.
    pub fn from_timeout(expire_timeout: i32) -> Self {
        match expire_timeout {
            0 => Self::Permanent,
            t if t < 0 => Self::Default,
            t => NonZeroU32::new(t.unsigned_abs()).map_or(Self::Default, Self::After),
        }
    }

    /// Converts back to the raw `expire_timeout` representation.
    pub fn as_timeout(&self) -> i32 {
        match self {
            Self::Permanent => 0,
            Self::Default => -1,
            Self::After(secs) => i32::try_from(secs.get()).unwrap_or(i32::MAX),
        }
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Resolves the countdown length in seconds.
    ///
    /// Returns `None` for permanent notifications. A zero default is bumped
    /// to one second, since a zero countdown would read as a cancel.
    pub fn countdown_secs(&self, default_secs: u32) -> Option<u32> {
        match self {
            Self::Permanent => None,
            Self::Default => Some(default_secs.max(1)),
            Self::After(secs) => Some(secs.get()),
        }
    }
}

// ============================================================================
// Revisions
// ============================================================================

/// One immutable snapshot of a notification's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRevision {
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub body: String,
}

impl NotificationRevision {
    /// Creates a revision stamped with the current time.
    pub fn new(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_timestamp(Utc::now(), summary, body)
    }

    pub fn with_timestamp(
        timestamp: DateTime<Utc>,
        summary: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            summary: summary.into(),
            body: body.into(),
        }
    }

    /// The status line text: `summary | body`.
    pub fn display_string(&self) -> String {
        format!("{} | {}", self.summary, self.body)
    }

    /// Whole seconds elapsed since this revision was created, rounded to
    /// the nearest second. Clock skew never yields a negative age.
    pub fn seconds_ago(&self, now: DateTime<Utc>) -> i64 {
        let millis = (now - self.timestamp).num_milliseconds().max(0);
        (millis + 500) / 1000
    }

    /// The seek-mode text: `(Ns ago) summary | body`.
    pub fn seek_string(&self, now: DateTime<Utc>) -> String {
        format!("({}s ago) {}", self.seconds_ago(now), self.display_string())
    }
}

// ============================================================================
// Notification
// ============================================================================

/// A notification and its full text history.
///
/// The revision history is append-only and never empty: the latest revision
/// lives in `current`, everything older in `history` (oldest first).
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub app_name: String,
    pub app_icon: String,
    pub actions: Vec<String>,
    pub expire: ExpirePolicy,
    history: Vec<NotificationRevision>,
    current: NotificationRevision,
    seen_by_user: bool,
}

impl Notification {
    pub fn new(
        id: NotificationId,
        app_name: impl Into<String>,
        app_icon: impl Into<String>,
        revision: NotificationRevision,
        actions: Vec<String>,
        expire: ExpirePolicy,
    ) -> Self {
        Self {
            id,
            app_name: app_name.into(),
            app_icon: app_icon.into(),
            actions,
            expire,
            history: Vec::new(),
            current: revision,
            seen_by_user: false,
        }
    }

    /// Merges an update into this notification.
    ///
    /// Metadata is overwritten, the revision is appended and the notification
    /// becomes unseen again.
    pub fn apply_update(
        &mut self,
        app_name: String,
        app_icon: String,
        revision: NotificationRevision,
        actions: Vec<String>,
        expire: ExpirePolicy,
    ) {
        self.app_name = app_name;
        self.app_icon = app_icon;
        self.actions = actions;
        self.expire = expire;
        let previous = std::mem::replace(&mut self.current, revision);
        self.history.push(previous);
        self.seen_by_user = false;
    }

    /// The most recent revision.
    pub fn latest(&self) -> &NotificationRevision {
        &self.current
    }

    /// Revision at `index` (0 = oldest).
    pub fn revision(&self, index: usize) -> Option<&NotificationRevision> {
        if index == self.history.len() {
            Some(&self.current)
        } else {
            self.history.get(index)
        }
    }

    /// Iterates revisions oldest first.
    pub fn revisions(&self) -> impl Iterator<Item = &NotificationRevision> {
        self.history.iter().chain(std::iter::once(&self.current))
    }

    pub fn revision_count(&self) -> usize {
        self.history.len() + 1
    }

    /// Index of the latest revision.
    pub fn last_index(&self) -> usize {
        self.history.len()
    }

    pub fn display_string(&self) -> String {
        self.current.display_string()
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.expire.is_permanent()
    }

    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.seen_by_user
    }

    pub fn mark_seen(&mut self) {
        self.seen_by_user = true;
    }
}

/// Read-only snapshot of a notification for queries and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub app_name: String,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub revision_count: usize,
    pub actions: Vec<String>,
    pub expire: ExpirePolicy,
    pub seen_by_user: bool,
}

impl NotificationView {
    pub fn from_notification(notif: &Notification) -> Self {
        let latest = notif.latest();
        Self {
            id: notif.id,
            app_name: notif.app_name.clone(),
            app_icon: notif.app_icon.clone(),
            summary: latest.summary.clone(),
            body: latest.body.clone(),
            revision_count: notif.revision_count(),
            actions: notif.actions.clone(),
            expire: notif.expire,
            seen_by_user: notif.seen_by_user,
        }
    }
}
