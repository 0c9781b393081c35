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

//! In-memory notification store, newest-first.

use std::sync::{Arc, Mutex, PoisonError};

use crate::models::NotificationData;

/// Thread-safe store of user-visible notifications.
///
/// Cheaply cloneable; all clones share the same underlying list.
#[derive(Clone, Debug, Default)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Vec<NotificationData>>>,
}

impl NotificationCenter {
    /// Creates an empty notification center.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NotificationData>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a notification at the front of the list.
    pub fn push(&self, notification: NotificationData) {
        self.lock().insert(0, notification);
    }

    /// Marks the notification with `id` as read, returning whether it was found.
    pub fn mark_read(&self, id: &str) -> bool {
        let mut notifications = self.lock();
        if let Some(notification) = notifications.iter_mut().find(|n| n.id == id) {
            notification.read = true;
            true
        } else {
            false
        }
    }

    /// Marks all notifications as read.
    pub fn mark_all_read(&self) {
        for notification in self.lock().iter_mut() {
            notification.read = true;
        }
    }

    /// Removes the notification with `id`, returning whether it was found.
    pub fn remove(&self, id: &str) -> bool {
        let mut notifications = self.lock();
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        notifications.len() < before
    }

    /// Removes all notifications.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Returns the number of unread notifications.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.lock().iter().filter(|n| !n.read).count()
    }

    /// Returns a snapshot of all notifications, newest first.
    #[must_use]
    pub fn all(&self) -> Vec<NotificationData> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn notification(id: &str) -> NotificationData {
        NotificationData::from_payload(&json!({
            "id": id,
            "title": "Test",
            "body": "body",
        }))
    }

    #[rstest]
    fn test_push_is_newest_first() {
        let center = NotificationCenter::new();
        center.push(notification("n-1"));
        center.push(notification("n-2"));

        let all = center.all();
        assert_eq!(all[0].id, "n-2");
        assert_eq!(all[1].id, "n-1");
    }

    #[rstest]
    fn test_mark_read_and_unread_count() {
        let center = NotificationCenter::new();
        center.push(notification("n-1"));
        center.push(notification("n-2"));
        assert_eq!(center.unread_count(), 2);

        assert!(center.mark_read("n-1"));
        assert_eq!(center.unread_count(), 1);
        assert!(!center.mark_read("missing"));

        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
    }

    #[rstest]
    fn test_remove_and_clear() {
        let center = NotificationCenter::new();
        center.push(notification("n-1"));
        center.push(notification("n-2"));

        assert!(center.remove("n-1"));
        assert!(!center.remove("n-1"));
        assert_eq!(center.all().len(), 1);

        center.clear();
        assert!(center.all().is_empty());
    }
}
