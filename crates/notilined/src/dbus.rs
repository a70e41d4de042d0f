//! `org.freedesktop.Notifications` ingress on the session bus.
//!
//! A thin adapter: every `Notify` call becomes a [`NotifyRequest`] and waits
//! for the store to hand back the id, `CloseNotification` becomes a close.
//! The bus speaks milliseconds for `expire_timeout`; the store works in
//! whole seconds.

use std::collections::HashMap;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use zbus::zvariant::OwnedValue;
use zbus::{fdo, interface};

use crate::store::{NotifyRequest, StoreHandle};

/// Well-known bus name claimed by the daemon.
pub const BUS_NAME: &str = "org.freedesktop.Notifications";

/// Object path the interface is served at.
pub const OBJECT_PATH: &str = "/org/freedesktop/Notifications";

/// Desktop Notifications protocol version implemented.
const SPEC_VERSION: &str = "1.2";

const CAPABILITIES: [&str; 3] = ["actions", "body", "persistence"];

/// Converts a bus `expire_timeout` (milliseconds) to whole seconds.
///
/// Positive values round up so that a short timeout never becomes
/// "permanent"; `0` and negative values keep their meaning.
pub fn timeout_ms_to_secs(expire_timeout_ms: i32) -> i32 {
    if expire_timeout_ms <= 0 {
        expire_timeout_ms
    } else {
        expire_timeout_ms / 1000 + i32::from(expire_timeout_ms % 1000 != 0)
    }
}

/// The bus-facing notification server.
pub struct NotificationServer {
    store: StoreHandle,
}

impl NotificationServer {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }
}

#[interface(name = "org.freedesktop.Notifications")]
impl NotificationServer {
    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        app_name: String,
        replaces_id: u32,
        app_icon: String,
        summary: String,
        body: String,
        actions: Vec<String>,
        _hints: HashMap<String, OwnedValue>,
        expire_timeout: i32,
    ) -> fdo::Result<u32> {
        debug!(
            app = %app_name,
            replaces_id,
            expire_timeout,
            "Notify call"
        );

        let request = NotifyRequest::new(summary, body)
            .with_app(app_name, app_icon)
            .replacing(replaces_id)
            .with_actions(actions)
            .with_timeout(timeout_ms_to_secs(expire_timeout));

        self.store
            .notify(request)
            .await
            .map(u32::from)
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    async fn close_notification(&self, id: u32) -> fdo::Result<()> {
        debug!(id, "CloseNotification call");
        self.store
            .close(id)
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    fn get_capabilities(&self) -> Vec<String> {
        CAPABILITIES.iter().map(|c| c.to_string()).collect()
    }

    /// Returns `(name, vendor, version, spec_version)`.
    fn get_server_information(&self) -> (String, String, String, String) {
        (
            "notiline".to_string(),
            "notiline".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            SPEC_VERSION.to_string(),
        )
    }
}

/// Claims the bus name and serves the interface until `cancel_token` fires.
pub async fn serve(store: StoreHandle, cancel_token: CancellationToken) -> Result<(), DbusError> {
    let connection = zbus::connection::Builder::session()
        .map_err(DbusError::connect)?
        .name(BUS_NAME)
        .map_err(DbusError::connect)?
        .serve_at(OBJECT_PATH, NotificationServer::new(store))
        .map_err(DbusError::connect)?
        .build()
        .await
        .map_err(|e| DbusError::NameTaken(e.to_string()))?;

    info!(name = BUS_NAME, path = OBJECT_PATH, "Serving notifications on the session bus");

    cancel_token.cancelled().await;
    drop(connection);

    info!("Session bus connection closed");
    Ok(())
}

/// Errors raised by the bus adapter.
#[derive(Debug, Clone, Error)]
pub enum DbusError {
    #[error("Failed to connect to the session bus: {0}")]
    Connect(String),

    #[error("Could not claim {BUS_NAME}: {0}")]
    NameTaken(String),
}

impl DbusError {
    fn connect(err: zbus::Error) -> Self {
        Self::Connect(err.to_string())
    }
}
