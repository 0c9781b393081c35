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

//! Real-time connectivity core for the DroneBook client.
//!
//! This crate provides a persistent bidirectional event channel that survives
//! network flakiness, authentication transitions, and app foreground/background
//! cycles:
//!
//! - [`transport`]: a thin, testable wrapper over one WebSocket connection.
//! - [`backoff`]: pure exponential-backoff computation for reconnects.
//! - [`registry`]: connection-independent subscription bookkeeping — active
//!   interest survives reconnects, so consumers never re-subscribe manually.
//! - [`router`]: demultiplexes inbound envelopes by type to subscribers.
//! - [`supervisor`]: the connection state machine owning retry decisions and
//!   emitting lifecycle events; every recovery emits `Connected`, which
//!   consumers use to re-fetch authoritative state instead of relying on
//!   replay of missed messages.
//!
//! # Feature flags
//!
//! - `testing`: exposes the scriptable in-memory transport and wait helpers
//!   for downstream crates' tests.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backoff;
pub mod error;
pub mod messages;
pub mod registry;
pub mod router;
pub mod supervisor;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backoff::ReconnectPolicy;
pub use error::{ChannelError, CloseReason};
pub use messages::{Envelope, LifecycleEvent};
pub use registry::{SubscriptionHandle, SubscriptionRegistry};
pub use router::EventRouter;
pub use supervisor::{ConnectionState, ConnectionSupervisor, SupervisorConfig};
pub use transport::{ChannelTransport, WsTransport};
