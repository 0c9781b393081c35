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

//! Core constants for the DroneBook client.

// Production URLs
pub const DRONEBOOK_HTTP_URL: &str = "https://api.dronebooking.com";
pub const DRONEBOOK_WS_URL: &str = "wss://ws.dronebooking.com";

// Staging URLs
pub const DRONEBOOK_STAGING_HTTP_URL: &str = "https://staging-api.dronebooking.com";
pub const DRONEBOOK_STAGING_WS_URL: &str = "wss://staging-ws.dronebooking.com";

// Development URLs
pub const DRONEBOOK_DEV_HTTP_URL: &str = "http://localhost:8000";
pub const DRONEBOOK_DEV_WS_URL: &str = "ws://localhost:8080";

// API paths
pub const BOOKINGS_PATH: &str = "/api/bookings";
pub const DASHBOARD_STATS_PATH: &str = "/api/dashboard/stats";

// Inbound event types
pub const EVT_BOOKING_UPDATE: &str = "booking_update";
pub const EVT_NOTIFICATION: &str = "notification";
pub const EVT_CHAT_MESSAGE: &str = "chat_message";
pub const EVT_DRONE_STATUS: &str = "drone_status";

// Outbound event types
pub const EVT_DRONE_STATUS_REQUEST: &str = "drone_status_request";
