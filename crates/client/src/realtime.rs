// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! The real-time service: the application-facing facade over the event
//! channel.
//!
//! Wires the connection supervisor, subscription registry, notification
//! center, and REST resync together. Every `Connected` lifecycle event
//! (initial connect and each recovery) triggers a re-fetch of bookings and
//! dashboard statistics, since the channel does not replay missed messages.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use dronebook_network::{
    ChannelTransport, ConnectionState, ConnectionSupervisor, Envelope, EventRouter, LifecycleEvent,
    SubscriptionHandle, SubscriptionRegistry, WsTransport,
};
use serde_json::{Value, json};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    auth::AuthContext,
    config::ClientConfig,
    consts::{
        EVT_BOOKING_UPDATE, EVT_CHAT_MESSAGE, EVT_DRONE_STATUS, EVT_DRONE_STATUS_REQUEST,
        EVT_NOTIFICATION,
    },
    error::ClientError,
    models::NotificationData,
    notifications::NotificationCenter,
    resync::ResyncApi,
};

/// The application-facing real-time service.
///
/// Owns the connection supervisor and reacts to its lifecycle: resyncing REST
/// state on every connect, tracking online status, and feeding inbound
/// notification events into the [`NotificationCenter`].
#[derive(Debug)]
pub struct RealtimeService {
    registry: SubscriptionRegistry,
    supervisor: ConnectionSupervisor,
    notifications: NotificationCenter,
    online: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
    lifecycle_task: JoinHandle<()>,
}

impl RealtimeService {
    /// Creates a new service connecting over a real WebSocket transport.
    pub fn new(config: &ClientConfig, auth: &AuthContext, resync: Arc<dyn ResyncApi>) -> Self {
        Self::with_transport(config, auth, resync, Arc::new(WsTransport))
    }

    /// Creates a new service over the given transport.
    pub fn with_transport(
        config: &ClientConfig,
        auth: &AuthContext,
        resync: Arc<dyn ResyncApi>,
        transport: Arc<dyn ChannelTransport>,
    ) -> Self {
        let registry = SubscriptionRegistry::new();
        let notifications = NotificationCenter::new();

        let center = notifications.clone();
        registry.subscribe(EVT_NOTIFICATION, move |payload| {
            center.push(NotificationData::from_payload(payload));
            Ok(())
        });

        let center = notifications.clone();
        let resync_on_update = Arc::clone(&resync);
        registry.subscribe(EVT_BOOKING_UPDATE, move |payload| {
            if payload.get("message").is_some() {
                center.push(NotificationData::from_booking_update(payload));
            }
            let resync = Arc::clone(&resync_on_update);
            tokio::spawn(async move {
                run_resync(resync.as_ref()).await;
            });
            Ok(())
        });

        let router = EventRouter::new(registry.clone());
        let supervisor = ConnectionSupervisor::new(
            config.supervisor_config(),
            transport,
            router,
            Some(auth.watch()),
        );

        let online = Arc::new(AtomicBool::new(false));
        let exhausted = Arc::new(AtomicBool::new(false));
        let lifecycle_task = tokio::spawn(lifecycle_loop(
            supervisor.lifecycle_events(),
            Arc::clone(&resync),
            Arc::clone(&online),
            Arc::clone(&exhausted),
        ));

        Self {
            registry,
            supervisor,
            notifications,
            online,
            exhausted,
            lifecycle_task,
        }
    }

    /// Requests the channel be brought up.
    ///
    /// A no-op while already connected; also clears a previous give-up so
    /// reconnect attempts start fresh.
    pub fn start(&self) {
        self.supervisor.start();
    }

    /// Requests the channel be torn down without clearing subscriptions.
    pub fn stop(&self) {
        self.supervisor.stop();
    }

    /// Tears the service down: stops the channel, clears all subscriptions,
    /// and halts lifecycle processing.
    pub fn shutdown(&self) {
        self.supervisor.stop();
        self.registry.clear();
        self.lifecycle_task.abort();
    }

    /// Sends an event of `event_type` with `payload`, stamped with the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Channel`] when the channel is neither open nor
    /// connecting.
    pub fn send<T: AsRef<str>>(&self, event_type: T, payload: Value) -> Result<(), ClientError> {
        let envelope = Envelope::new(event_type.as_ref(), payload)
            .with_timestamp(Utc::now().to_rfc3339());
        self.supervisor.send(envelope)?;
        Ok(())
    }

    /// Sends a booking update for `booking_id`, merging `data` into the
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Channel`] when the channel is neither open nor
    /// connecting.
    pub fn send_booking_update(&self, booking_id: &str, data: Value) -> Result<(), ClientError> {
        let mut payload = match data {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        payload.insert("booking_id".to_string(), json!(booking_id));
        self.send(EVT_BOOKING_UPDATE, Value::Object(payload))
    }

    /// Sends a chat message, optionally scoped to a booking.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Channel`] when the channel is neither open nor
    /// connecting.
    pub fn send_chat_message(
        &self,
        message: &str,
        booking_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut payload = json!({ "message": message });
        if let Some(booking_id) = booking_id {
            payload["booking_id"] = json!(booking_id);
        }
        self.send(EVT_CHAT_MESSAGE, payload)
    }

    /// Requests a status report for the given drone.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Channel`] when the channel is neither open nor
    /// connecting.
    pub fn request_drone_status(&self, drone_id: &str) -> Result<(), ClientError> {
        self.send(EVT_DRONE_STATUS_REQUEST, json!({ "drone_id": drone_id }))
    }

    /// Subscribes to booking update events.
    pub fn on_booking_update<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.registry.subscribe(EVT_BOOKING_UPDATE, callback)
    }

    /// Subscribes to notification events.
    pub fn on_notification<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.registry.subscribe(EVT_NOTIFICATION, callback)
    }

    /// Subscribes to chat message events.
    pub fn on_chat_message<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.registry.subscribe(EVT_CHAT_MESSAGE, callback)
    }

    /// Subscribes to drone status events.
    pub fn on_drone_status<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.registry.subscribe(EVT_DRONE_STATUS, callback)
    }

    /// Removes the subscription identified by `handle`.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.registry.unsubscribe(handle)
    }

    /// Returns whether the channel is currently open.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Returns whether reconnection has given up; a subsequent [`Self::start`]
    /// resets this.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Returns a watch receiver observing state transitions.
    #[must_use]
    pub fn state_watch(&self) -> tokio::sync::watch::Receiver<ConnectionState> {
        self.supervisor.state_watch()
    }

    /// Returns a new receiver of lifecycle events.
    #[must_use]
    pub fn lifecycle_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.supervisor.lifecycle_events()
    }

    /// Returns the notification center.
    #[must_use]
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Returns the subscription registry.
    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

impl Drop for RealtimeService {
    fn drop(&mut self) {
        self.lifecycle_task.abort();
    }
}

async fn lifecycle_loop(
    mut events: broadcast::Receiver<LifecycleEvent>,
    resync: Arc<dyn ResyncApi>,
    online: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
) {
    loop {
        match events.recv().await {
            Ok(LifecycleEvent::Connected) => {
                online.store(true, Ordering::SeqCst);
                exhausted.store(false, Ordering::SeqCst);
                run_resync(resync.as_ref()).await;
            }
            Ok(LifecycleEvent::Disconnected) => {
                online.store(false, Ordering::SeqCst);
            }
            Ok(LifecycleEvent::Error(detail)) => {
                online.store(false, Ordering::SeqCst);
                tracing::debug!("Channel error: {detail}");
            }
            Ok(LifecycleEvent::MaxReconnectAttemptsReached) => {
                online.store(false, Ordering::SeqCst);
                exhausted.store(true, Ordering::SeqCst);
                tracing::warn!("Reconnection given up; manual start required");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Lifecycle receiver lagged, skipped {skipped} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn run_resync(resync: &dyn ResyncApi) {
    if let Err(error) = resync.fetch_bookings().await {
        tracing::error!("Failed to resync bookings: {error}");
    }
    if let Err(error) = resync.fetch_dashboard_stats().await {
        tracing::error!("Failed to resync dashboard stats: {error}");
    }
}
