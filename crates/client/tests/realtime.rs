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

//! Integration tests for the real-time service over a scriptable transport.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use dronebook_client::{
    AuthContext, Booking, ClientConfig, ClientError, DashboardStats, Environment, RealtimeService,
    ResyncApi,
};
use dronebook_network::{
    ChannelError, ChannelTransport, CloseReason, ConnectionState, Envelope,
    testing::{MockTransport, wait_until_async},
};
use serde_json::json;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct MockResync {
    bookings_calls: AtomicUsize,
    stats_calls: AtomicUsize,
}

impl MockResync {
    fn bookings_calls(&self) -> usize {
        self.bookings_calls.load(Ordering::SeqCst)
    }

    fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResyncApi for MockResync {
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        self.bookings_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(DashboardStats {
            total_bookings: 0,
            pending_bookings: 0,
            completed_bookings: 0,
            total_spent: 0.0,
            upcoming_bookings: Vec::new(),
        })
    }
}

struct Harness {
    service: RealtimeService,
    auth: AuthContext,
    transport: Arc<MockTransport>,
    resync: Arc<MockResync>,
}

fn build_harness() -> Harness {
    let mut config = ClientConfig::for_environment(Environment::Dev);
    config.reconnect_delay_initial_ms = 50;
    config.reconnect_delay_max_ms = 200;

    let auth = AuthContext::new();
    let transport = Arc::new(MockTransport::new());
    let resync = Arc::new(MockResync::default());
    let service = RealtimeService::with_transport(
        &config,
        &auth,
        Arc::clone(&resync) as Arc<dyn ResyncApi>,
        Arc::clone(&transport) as Arc<dyn ChannelTransport>,
    );

    Harness {
        service,
        auth,
        transport,
        resync,
    }
}

async fn open_channel(harness: &Harness) {
    harness.auth.set_token("jwt-test");
    let mut states = harness.service.state_watch();
    states
        .wait_for(|s| *s == ConnectionState::Open)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_login_brings_channel_up_and_resyncs() {
    let harness = build_harness();
    assert_eq!(harness.service.state(), ConnectionState::Idle);

    open_channel(&harness).await;

    wait_until_async(|| harness.resync.bookings_calls() == 1, TEST_TIMEOUT).await;
    wait_until_async(|| harness.resync.stats_calls() == 1, TEST_TIMEOUT).await;
    wait_until_async(|| harness.service.is_online(), TEST_TIMEOUT).await;
    assert_eq!(harness.transport.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_resyncs_again() {
    let harness = build_harness();
    open_channel(&harness).await;
    wait_until_async(|| harness.resync.bookings_calls() == 1, TEST_TIMEOUT).await;

    harness.transport.close_current(CloseReason::Normal);
    wait_until_async(|| harness.transport.connect_calls() == 2, TEST_TIMEOUT).await;
    wait_until_async(|| harness.resync.bookings_calls() == 2, TEST_TIMEOUT).await;
    assert_eq!(harness.resync.stats_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_notification_payload_defaults_land_in_center() {
    let harness = build_harness();
    open_channel(&harness).await;

    harness.transport.emit_message(Envelope::new(
        "notification",
        json!({"message": "Your booking was confirmed"}),
    ));

    wait_until_async(
        || !harness.service.notifications().all().is_empty(),
        TEST_TIMEOUT,
    )
    .await;

    let notifications = harness.service.notifications().all();
    assert_eq!(notifications[0].title, "New Notification");
    assert_eq!(notifications[0].body, "Your booking was confirmed");
    assert!(!notifications[0].read);
    assert_eq!(harness.service.notifications().unread_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_booking_update_with_message_notifies_and_resyncs() {
    let harness = build_harness();
    open_channel(&harness).await;
    wait_until_async(|| harness.resync.bookings_calls() == 1, TEST_TIMEOUT).await;

    harness.transport.emit_message(Envelope::new(
        "booking_update",
        json!({"booking_id": "b-1", "message": "Pilot assigned"}),
    ));

    wait_until_async(
        || !harness.service.notifications().all().is_empty(),
        TEST_TIMEOUT,
    )
    .await;
    wait_until_async(|| harness.resync.bookings_calls() == 2, TEST_TIMEOUT).await;

    let notifications = harness.service.notifications().all();
    assert_eq!(notifications[0].title, "Booking Update");
    assert_eq!(notifications[0].body, "Pilot assigned");
    assert_eq!(notifications[0].booking_id.as_deref(), Some("b-1"));
}

#[tokio::test(start_paused = true)]
async fn test_booking_update_without_message_resyncs_silently() {
    let harness = build_harness();
    open_channel(&harness).await;
    wait_until_async(|| harness.resync.bookings_calls() == 1, TEST_TIMEOUT).await;

    harness.transport.emit_message(Envelope::new(
        "booking_update",
        json!({"booking_id": "b-1", "status": "confirmed"}),
    ));

    wait_until_async(|| harness.resync.bookings_calls() == 2, TEST_TIMEOUT).await;
    assert!(harness.service.notifications().all().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_send_booking_update_wire_shape() {
    let harness = build_harness();
    open_channel(&harness).await;

    harness
        .service
        .send_booking_update("b-1", json!({"status": "confirmed"}))
        .unwrap();

    wait_until_async(|| !harness.transport.sent().is_empty(), TEST_TIMEOUT).await;

    let sent = harness.transport.sent();
    assert_eq!(sent[0].event_type.as_str(), "booking_update");
    assert_eq!(sent[0].payload["booking_id"], "b-1");
    assert_eq!(sent[0].payload["status"], "confirmed");
    assert!(sent[0].timestamp.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_chat_message_omits_booking_id_when_unscoped() {
    let harness = build_harness();
    open_channel(&harness).await;

    harness.service.send_chat_message("hello", None).unwrap();
    harness
        .service
        .send_chat_message("scoped", Some("b-2"))
        .unwrap();

    wait_until_async(|| harness.transport.sent().len() == 2, TEST_TIMEOUT).await;

    let sent = harness.transport.sent();
    assert_eq!(sent[0].event_type.as_str(), "chat_message");
    assert_eq!(sent[0].payload["message"], "hello");
    assert!(sent[0].payload.get("booking_id").is_none());
    assert_eq!(sent[1].payload["booking_id"], "b-2");
}

#[tokio::test(start_paused = true)]
async fn test_request_drone_status_wire_shape() {
    let harness = build_harness();
    open_channel(&harness).await;

    harness.service.request_drone_status("d-7").unwrap();
    wait_until_async(|| !harness.transport.sent().is_empty(), TEST_TIMEOUT).await;

    let sent = harness.transport.sent();
    assert_eq!(sent[0].event_type.as_str(), "drone_status_request");
    assert_eq!(sent[0].payload["drone_id"], "d-7");
}

#[tokio::test(start_paused = true)]
async fn test_logout_tears_channel_down() {
    let harness = build_harness();
    open_channel(&harness).await;

    harness.auth.clear_token();
    let mut states = harness.service.state_watch();
    states
        .wait_for(|s| *s == ConnectionState::Idle)
        .await
        .unwrap();

    wait_until_async(|| !harness.service.is_online(), TEST_TIMEOUT).await;

    tokio::time::advance(Duration::from_secs(120)).await;
    assert_eq!(harness.transport.connect_calls(), 1);

    let error = harness.service.send("chat_message", json!({})).unwrap_err();
    assert!(matches!(
        error,
        ClientError::Channel(ChannelError::NotConnected)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_send_while_logged_out_errors() {
    let harness = build_harness();

    let error = harness
        .service
        .send_chat_message("too early", None)
        .unwrap_err();
    assert!(matches!(
        error,
        ClientError::Channel(ChannelError::NotConnected)
    ));
    assert_eq!(harness.transport.connect_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_give_up_sets_exhausted_until_restart() {
    let harness = build_harness();
    let mut config = ClientConfig::for_environment(Environment::Dev);
    config.reconnect_delay_initial_ms = 50;
    config.reconnect_delay_max_ms = 200;
    config.reconnect_max_attempts = 3;

    let transport = Arc::new(MockTransport::new());
    transport.fail_next(3);
    let resync = Arc::new(MockResync::default());
    let service = RealtimeService::with_transport(
        &config,
        &harness.auth,
        Arc::clone(&resync) as Arc<dyn ResyncApi>,
        Arc::clone(&transport) as Arc<dyn ChannelTransport>,
    );

    harness.auth.set_token("jwt-test");
    wait_until_async(|| service.is_exhausted(), TEST_TIMEOUT).await;
    assert_eq!(service.state(), ConnectionState::Failed);
    assert_eq!(transport.connect_calls(), 3);

    service.start();
    let mut states = service.state_watch();
    states
        .wait_for(|s| *s == ConnectionState::Open)
        .await
        .unwrap();
    wait_until_async(|| !service.is_exhausted(), TEST_TIMEOUT).await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_clears_subscriptions() {
    let harness = build_harness();
    open_channel(&harness).await;

    harness.service.shutdown();
    let mut states = harness.service.state_watch();
    states
        .wait_for(|s| *s == ConnectionState::Idle)
        .await
        .unwrap();
    assert_eq!(harness.service.registry().subscription_count("notification"), 0);
}
