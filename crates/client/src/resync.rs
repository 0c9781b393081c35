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

//! REST resynchronization after (re)connects.
//!
//! The channel does not replay messages missed while offline. Instead, every
//! `Connected` lifecycle event triggers a re-fetch of the authoritative state
//! through this API.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    auth::AuthContext,
    config::ClientConfig,
    consts::{BOOKINGS_PATH, DASHBOARD_STATS_PATH},
    error::ClientError,
    models::{ApiResponse, Booking, DashboardStats},
};

/// The REST surface re-fetched after every (re)connect.
#[async_trait]
pub trait ResyncApi: Send + Sync + Debug {
    /// Fetches the current user's bookings.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unsuccessful API response.
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, ClientError>;

    /// Fetches the current user's dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unsuccessful API response.
    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ClientError>;
}

/// HTTP implementation of [`ResyncApi`] against the DroneBook REST API.
#[derive(Clone, Debug)]
pub struct HttpResyncClient {
    client: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpResyncClient {
    /// Creates a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, auth: AuthContext) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            auth,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(token) = self.auth.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let envelope: ApiResponse<T> = response.json().await?;
        envelope.into_result()
    }
}

#[async_trait]
impl ResyncApi for HttpResyncClient {
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        self.get_json(BOOKINGS_PATH).await
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        self.get_json(DASHBOARD_STATS_PATH).await
    }
}
