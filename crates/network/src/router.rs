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

//! Demultiplexes inbound envelopes to registered subscribers.

use crate::{messages::Envelope, registry::SubscriptionRegistry};

/// Routes inbound envelopes by event type to the callbacks currently held in
/// the [`SubscriptionRegistry`].
#[derive(Clone, Debug)]
pub struct EventRouter {
    registry: SubscriptionRegistry,
}

impl EventRouter {
    /// Creates a new [`EventRouter`] reading from `registry`.
    #[must_use]
    pub const fn new(registry: SubscriptionRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry this router reads from.
    #[must_use]
    pub const fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Delivers `envelope` to every subscriber of its event type,
    /// synchronously, in registration order.
    ///
    /// Event types without direct subscribers fall back to the catch-all
    /// registrations; with neither, the envelope is dropped silently (logged,
    /// not fatal). A failing callback is logged and never prevents the
    /// remaining callbacks from running.
    pub fn route(&self, envelope: &Envelope) {
        let mut callbacks = self.registry.callbacks_for(&envelope.event_type);
        if callbacks.is_empty() {
            callbacks = self.registry.catch_all_callbacks();
        }
        if callbacks.is_empty() {
            tracing::debug!(
                "No subscribers for event type '{}', dropping envelope",
                envelope.event_type
            );
            return;
        }

        for callback in callbacks {
            if let Err(e) = callback(&envelope.payload) {
                tracing::error!(
                    "Subscriber callback failed for '{}': {e}",
                    envelope.event_type
                );
            }
        }
    }
}
