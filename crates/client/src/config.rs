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

//! Client configuration and environment selection.

use dronebook_network::SupervisorConfig;
use dronebook_network::backoff::{
    DEFAULT_DELAY_INITIAL_MS, DEFAULT_DELAY_MAX_MS, DEFAULT_MAX_ATTEMPTS,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::consts::{
    DRONEBOOK_DEV_HTTP_URL, DRONEBOOK_DEV_WS_URL, DRONEBOOK_HTTP_URL, DRONEBOOK_STAGING_HTTP_URL,
    DRONEBOOK_STAGING_WS_URL, DRONEBOOK_WS_URL,
};

/// The default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// The default channel connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// The deployment environment targeted by the client.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    Dev,
    Staging,
    #[default]
    Prod,
}

/// Configuration for the DroneBook client, covering both the REST API and
/// the real-time channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The base URL for the REST API.
    pub api_url: String,
    /// The URL for the real-time event channel.
    pub ws_url: String,
    /// The HTTP request timeout in seconds.
    pub http_timeout_secs: u64,
    /// The channel connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// The initial reconnect delay in milliseconds.
    pub reconnect_delay_initial_ms: u64,
    /// The maximum reconnect delay in milliseconds.
    pub reconnect_delay_max_ms: u64,
    /// The maximum number of consecutive reconnect attempts before giving up.
    pub reconnect_max_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl ClientConfig {
    /// Returns the configuration for the given deployment environment.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        let (api_url, ws_url) = match environment {
            Environment::Dev => (DRONEBOOK_DEV_HTTP_URL, DRONEBOOK_DEV_WS_URL),
            Environment::Staging => (DRONEBOOK_STAGING_HTTP_URL, DRONEBOOK_STAGING_WS_URL),
            Environment::Prod => (DRONEBOOK_HTTP_URL, DRONEBOOK_WS_URL),
        };
        Self {
            api_url: api_url.to_string(),
            ws_url: ws_url.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            reconnect_delay_initial_ms: DEFAULT_DELAY_INITIAL_MS,
            reconnect_delay_max_ms: DEFAULT_DELAY_MAX_MS,
            reconnect_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Derives the supervisor configuration for the real-time channel.
    #[must_use]
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            url: self.ws_url.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            reconnect_delay_initial_ms: self.reconnect_delay_initial_ms,
            reconnect_delay_max_ms: self.reconnect_delay_max_ms,
            reconnect_max_attempts: self.reconnect_max_attempts,
            ..SupervisorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Environment::Dev, "http://localhost:8000", "ws://localhost:8080")]
    #[case(
        Environment::Prod,
        "https://api.dronebooking.com",
        "wss://ws.dronebooking.com"
    )]
    fn test_environment_urls(#[case] env: Environment, #[case] api: &str, #[case] ws: &str) {
        let config = ClientConfig::for_environment(env);
        assert_eq!(config.api_url, api);
        assert_eq!(config.ws_url, ws);
    }

    #[rstest]
    fn test_default_reconnect_settings() {
        let config = ClientConfig::default();
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.connect_timeout_ms, 5_000);
        assert_eq!(config.reconnect_delay_initial_ms, 1_000);
        assert_eq!(config.reconnect_delay_max_ms, 30_000);
        assert_eq!(config.reconnect_max_attempts, 10);
    }

    #[rstest]
    fn test_supervisor_config_carries_channel_settings() {
        let config = ClientConfig::for_environment(Environment::Dev);
        let supervisor = config.supervisor_config();
        assert_eq!(supervisor.url, "ws://localhost:8080");
        assert_eq!(supervisor.connect_timeout_ms, 5_000);
        assert_eq!(supervisor.reconnect_max_attempts, 10);
    }
}
