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

//! Shared authentication state.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared, observable holder of the current access token.
///
/// The real-time supervisor watches this: setting a token starts the
/// channel, clearing it tears the channel down.
#[derive(Clone, Debug)]
pub struct AuthContext {
    token_tx: Arc<watch::Sender<Option<String>>>,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext {
    /// Creates a new, logged-out context.
    #[must_use]
    pub fn new() -> Self {
        let (token_tx, _) = watch::channel(None);
        Self {
            token_tx: Arc::new(token_tx),
        }
    }

    /// Stores the access token, marking the session as authenticated.
    pub fn set_token<T: Into<String>>(&self, token: T) {
        self.token_tx.send_replace(Some(token.into()));
    }

    /// Clears the access token, marking the session as logged out.
    pub fn clear_token(&self) {
        self.token_tx.send_replace(None);
    }

    /// Returns the current access token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token_tx.borrow().clone()
    }

    /// Returns whether a token is currently set.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token_tx.borrow().is_some()
    }

    /// Returns a watch receiver observing token changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<String>> {
        self.token_tx.subscribe()
    }
}
