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

//! Error types produced by the DroneBook client.

use dronebook_network::ChannelError;
use thiserror::Error;

/// A typed error enumeration for the DroneBook client.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// HTTP transport failure (connectivity, timeout, non-success status).
    #[error("HTTP error: {0}")]
    Http(String),
    /// Error returned by the DroneBook API (`success: false` envelope).
    #[error("API error: {0}")]
    Api(String),
    /// Failure decoding a response body.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Real-time channel error.
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_client_error_display() {
        let error = ClientError::Api("booking not found".to_string());
        assert_eq!(error.to_string(), "API error: booking not found");

        let error = ClientError::from(ChannelError::NotConnected);
        assert_eq!(error.to_string(), "Channel error: Not connected");
    }
}
