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

//! Application layer of the DroneBook real-time client.
//!
//! Builds on [`dronebook_network`] with the DroneBook domain:
//!
//! - [`models`]: bookings, dashboard stats, notifications, and the REST
//!   response envelope.
//! - [`config`]: per-environment endpoint and timing configuration.
//! - [`auth`]: shared token state driving channel lifecycle.
//! - [`resync`]: the REST surface re-fetched after every (re)connect.
//! - [`notifications`]: the in-memory notification store.
//! - [`realtime`]: the facade wiring the channel, resync, and notifications
//!   together.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod config;
pub mod consts;
pub mod error;
pub mod models;
pub mod notifications;
pub mod realtime;
pub mod resync;

pub use auth::AuthContext;
pub use config::{ClientConfig, Environment};
pub use error::ClientError;
pub use models::{
    ApiResponse, Booking, BookingStatus, DashboardStats, NotificationData, NotificationKind,
    PaymentStatus,
};
pub use notifications::NotificationCenter;
pub use realtime::RealtimeService;
pub use resync::{HttpResyncClient, ResyncApi};
