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

//! Registry of active subscriptions (event type to callback sets).
//!
//! Subscriptions are independent of connection state: callers may subscribe
//! before any connection exists, and registrations survive reconnects. The
//! registry outlives any individual connection; that is the point. All
//! mutation goes through a single mutex since the invariants depend on atomic
//! read-modify-write of small in-memory tables.

use std::{
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use ahash::AHashMap;
use serde_json::Value;
use ustr::Ustr;

/// A subscriber callback invoked with each matching envelope payload.
///
/// A returned error is logged by the router and never aborts delivery to
/// other subscribers.
pub type EventCallback = Arc<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync>;

/// Opaque handle identifying exactly one registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    table: AHashMap<Ustr, Vec<(SubscriptionHandle, EventCallback)>>,
    catch_all: Vec<(SubscriptionHandle, EventCallback)>,
}

impl RegistryInner {
    fn next_handle(&mut self) -> SubscriptionHandle {
        self.next_id += 1;
        SubscriptionHandle(self.next_id)
    }
}

/// Tracks active interest in event types, multicast per type.
///
/// Cloning is cheap and shares the underlying table.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SubscriptionRegistry")
            .field("event_types", &inner.table.len())
            .field("catch_all", &inner.catch_all.len())
            .finish()
    }
}

impl SubscriptionRegistry {
    /// Creates a new empty [`SubscriptionRegistry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `callback` for envelopes of `event_type`.
    ///
    /// Multiple subscriptions may share an event type; callbacks are invoked
    /// in registration order.
    pub fn subscribe<T, F>(&self, event_type: T, callback: F) -> SubscriptionHandle
    where
        T: AsRef<str>,
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let event_type = Ustr::from(event_type.as_ref());
        let mut inner = self.lock();
        let handle = inner.next_handle();
        inner
            .table
            .entry(event_type)
            .or_default()
            .push((handle, Arc::new(callback)));
        tracing::debug!("Subscribed {handle:?} to '{event_type}'");
        handle
    }

    /// Registers a catch-all callback, invoked for envelopes whose event type
    /// has no direct subscribers.
    pub fn subscribe_any<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let handle = inner.next_handle();
        inner.catch_all.push((handle, Arc::new(callback)));
        tracing::debug!("Subscribed {handle:?} as catch-all");
        handle
    }

    /// Removes exactly the registration identified by `handle`.
    ///
    /// Returns whether a registration was removed.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut inner = self.lock();

        for subscriptions in inner.table.values_mut() {
            if let Some(pos) = subscriptions.iter().position(|(h, _)| *h == handle) {
                subscriptions.remove(pos);
                return true;
            }
        }

        if let Some(pos) = inner.catch_all.iter().position(|(h, _)| *h == handle) {
            inner.catch_all.remove(pos);
            return true;
        }

        false
    }

    /// Removes every registration for `event_type`, returning how many were
    /// removed.
    pub fn unsubscribe_all<T: AsRef<str>>(&self, event_type: T) -> usize {
        let event_type = Ustr::from(event_type.as_ref());
        self.lock()
            .table
            .remove(&event_type)
            .map_or(0, |subscriptions| subscriptions.len())
    }

    /// Clears all registrations (process teardown).
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.table.clear();
        inner.catch_all.clear();
    }

    /// Returns the number of registrations for `event_type`.
    #[must_use]
    pub fn subscription_count<T: AsRef<str>>(&self, event_type: T) -> usize {
        let event_type = Ustr::from(event_type.as_ref());
        self.lock().table.get(&event_type).map_or(0, Vec::len)
    }

    /// Snapshot of the callbacks for `event_type`, in registration order.
    pub(crate) fn callbacks_for(&self, event_type: &Ustr) -> Vec<EventCallback> {
        self.lock()
            .table
            .get(event_type)
            .map_or_else(Vec::new, |subscriptions| {
                subscriptions.iter().map(|(_, cb)| Arc::clone(cb)).collect()
            })
    }

    /// Snapshot of the catch-all callbacks, in registration order.
    pub(crate) fn catch_all_callbacks(&self) -> Vec<EventCallback> {
        self.lock()
            .catch_all
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect()
    }
}
