//! Store actor commands, queries and errors.

use chrono::{DateTime, Utc};
use notiline_core::{NavCommand, NotificationId, NotificationView};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

// ============================================================================
// Create / Update Request
// ============================================================================

/// A create-or-update event from a producer.
///
/// Field semantics follow the desktop notification call: `replaces_id == 0`
/// asks for a new notification, and `expire_timeout` is `0` for permanent,
/// negative for the default, or a number of whole seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRequest {
    pub app_name: String,
    pub replaces_id: u32,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<String>,
    pub expire_timeout: i32,
    pub received_at: DateTime<Utc>,
}

impl NotifyRequest {
    /// A new notification with the default timeout, received now.
    pub fn new(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            app_name: String::new(),
            replaces_id: 0,
            app_icon: String::new(),
            summary: summary.into(),
            body: body.into(),
            actions: Vec::new(),
            expire_timeout: -1,
            received_at: Utc::now(),
        }
    }

    pub fn with_app(mut self, app_name: impl Into<String>, app_icon: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self.app_icon = app_icon.into();
        self
    }

    pub fn replacing(mut self, replaces_id: u32) -> Self {
        self.replaces_id = replaces_id;
        self
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_timeout(mut self, expire_timeout: i32) -> Self {
        self.expire_timeout = expire_timeout;
        self
    }
}

// ============================================================================
// Store Commands
// ============================================================================

/// Commands sent to the store actor.
#[derive(Debug)]
pub enum StoreCommand {
    /// Create or update a notification.
    ///
    /// The request is boxed to keep the enum small. The assigned id is sent
    /// back exactly once, through this command's own reply channel.
    Notify {
        request: Box<NotifyRequest>,
        respond_to: oneshot::Sender<NotificationId>,
    },

    /// Mark a notification seen (an external close). Unknown ids are ignored.
    Close { id: u32 },

    /// A remote navigation command.
    Navigate(NavCommand),

    /// Read-only view of the whole store.
    Snapshot {
        respond_to: oneshot::Sender<StoreSnapshot>,
    },
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    /// Notifications, oldest first.
    pub notifications: Vec<NotificationView>,
    /// Notification under the cursor.
    pub showing: Option<NotificationId>,
    /// Revision index while seeking.
    pub seeking_at: Option<usize>,
    /// The display string last published.
    pub status: String,
}

impl StoreSnapshot {
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn get(&self, id: NotificationId) -> Option<&NotificationView> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Ids in sequence order.
    pub fn ids(&self) -> Vec<NotificationId> {
        self.notifications.iter().map(|n| n.id).collect()
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The actor has shut down.
    #[error("store channel closed")]
    ChannelClosed,
}
