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

//! Domain models for the DroneBook REST API and real-time payloads.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::error::ClientError;

/// The lifecycle status of a booking.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// The payment status of a booking.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// A drone service booking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub service_type: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub booking_date: String,
    pub booking_time: String,
    /// Duration in hours.
    pub duration: u32,
    pub purpose: String,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub drone_type: String,
    #[serde(default)]
    pub pilot_assigned: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregate dashboard statistics for the current user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_bookings: u32,
    pub pending_bookings: u32,
    pub completed_bookings: u32,
    pub total_spent: f64,
    pub upcoming_bookings: Vec<Booking>,
}

/// The category of a user-visible notification.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Booking,
    Payment,
    #[default]
    General,
}

/// A user-visible notification, rendered by the local notification surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub booking_id: Option<String>,
    pub read: bool,
    pub created_at: String,
}

impl NotificationData {
    /// Builds a notification from a raw `notification` payload: a generated
    /// id when none is given, a generic title, `body` falling back to
    /// `message`, and kind `general`.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let now = Utc::now();
        Self {
            id: payload
                .get("id")
                .and_then(Value::as_str)
                .map_or_else(|| now.timestamp_millis().to_string(), ToString::to_string),
            title: payload
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("New Notification")
                .to_string(),
            body: payload
                .get("body")
                .or_else(|| payload.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            kind: payload
                .get("type")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            booking_id: payload
                .get("booking_id")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            read: false,
            created_at: payload
                .get("created_at")
                .and_then(Value::as_str)
                .map_or_else(|| now.to_rfc3339(), ToString::to_string),
        }
    }

    /// Builds the notification surfaced for a `booking_update` payload
    /// carrying a human-readable `message`.
    #[must_use]
    pub fn from_booking_update(payload: &Value) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            title: "Booking Update".to_string(),
            body: payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            kind: NotificationKind::Booking,
            booking_id: payload
                .get("booking_id")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            read: false,
            created_at: now.to_rfc3339(),
        }
    }
}

/// The response envelope used by every DroneBook REST endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwraps the envelope into its payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when `success` is false or the payload is
    /// missing.
    pub fn into_result(self) -> Result<T, ClientError> {
        if self.success {
            self.data
                .ok_or_else(|| ClientError::Api("response missing data".to_string()))
        } else {
            let detail = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "unknown error".to_string());
            Err(ClientError::Api(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn booking_json() -> Value {
        json!({
            "id": "b-1",
            "user_id": "u-1",
            "service_type": "aerial_photography",
            "location": "Marina Beach",
            "latitude": 13.05,
            "longitude": 80.28,
            "booking_date": "2025-02-01",
            "booking_time": "09:30",
            "duration": 2,
            "purpose": "real estate shoot",
            "status": "confirmed",
            "total_amount": 4500.0,
            "payment_status": "paid",
            "drone_type": "quad-pro",
            "pilot_assigned": "p-3",
            "created_at": "2025-01-15T10:00:00Z",
            "updated_at": "2025-01-16T08:00:00Z"
        })
    }

    #[rstest]
    fn test_booking_deserializes_api_shape() {
        let booking: Booking = serde_json::from_value(booking_json()).unwrap();

        assert_eq!(booking.id, "b-1");
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.pilot_assigned.as_deref(), Some("p-3"));
        assert!(booking.special_instructions.is_none());
    }

    #[rstest]
    #[case(BookingStatus::Pending, "pending")]
    #[case(BookingStatus::InProgress, "in_progress")]
    #[case(BookingStatus::Cancelled, "cancelled")]
    fn test_booking_status_string_forms(#[case] status: BookingStatus, #[case] expected: &str) {
        assert_eq!(status.to_string(), expected);
        assert_eq!(serde_json::to_value(status).unwrap(), expected);
    }

    #[rstest]
    fn test_dashboard_stats_deserializes() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "total_bookings": 12,
            "pending_bookings": 2,
            "completed_bookings": 9,
            "total_spent": 54000.0,
            "upcoming_bookings": [booking_json()]
        }))
        .unwrap();

        assert_eq!(stats.total_bookings, 12);
        assert_eq!(stats.upcoming_bookings.len(), 1);
    }

    #[rstest]
    fn test_notification_from_payload_applies_defaults() {
        let notification = NotificationData::from_payload(&json!({
            "message": "Your booking was confirmed"
        }));

        assert_eq!(notification.title, "New Notification");
        assert_eq!(notification.body, "Your booking was confirmed");
        assert_eq!(notification.kind, NotificationKind::General);
        assert!(!notification.read);
        assert!(!notification.id.is_empty());
    }

    #[rstest]
    fn test_notification_from_payload_keeps_explicit_fields() {
        let notification = NotificationData::from_payload(&json!({
            "id": "n-1",
            "title": "Payment received",
            "body": "Thanks!",
            "type": "payment",
            "booking_id": "b-1",
            "created_at": "2025-01-15T10:00:00Z"
        }));

        assert_eq!(notification.id, "n-1");
        assert_eq!(notification.kind, NotificationKind::Payment);
        assert_eq!(notification.booking_id.as_deref(), Some("b-1"));
        assert_eq!(notification.created_at, "2025-01-15T10:00:00Z");
    }

    #[rstest]
    fn test_api_response_into_result() {
        let ok: ApiResponse<u32> = serde_json::from_value(json!({
            "success": true,
            "data": 7
        }))
        .unwrap();
        assert_eq!(ok.into_result().unwrap(), 7);

        let err: ApiResponse<u32> = serde_json::from_value(json!({
            "success": false,
            "error": "unauthorized"
        }))
        .unwrap();
        let error = err.into_result().unwrap_err();
        assert_eq!(error.to_string(), "API error: unauthorized");
    }
}
