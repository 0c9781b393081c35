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

//! Error types produced by the real-time channel layer.

use strum::{AsRefStr, Display};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// A typed error enumeration for the real-time channel layer.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// Failure to establish the underlying connection (malformed URL, refusal, timeout).
    #[error("Connect error: {0}")]
    Connect(String),
    /// Send attempted on a transport channel which is not open.
    #[error("Channel not open")]
    NotOpen,
    /// Send attempted while the supervisor is idle, closing, or failed.
    #[error("Not connected")]
    NotConnected,
    /// Failure during JSON serialization/deserialization of an envelope.
    #[error("JSON error: {0}")]
    Json(String),
    /// Transport or internal channel error.
    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<tungstenite::Error> for ChannelError {
    fn from(error: tungstenite::Error) -> Self {
        Self::Channel(error.to_string())
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

/// The reason a transport channel terminated.
///
/// Exactly one close reason is surfaced per open attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CloseReason {
    /// Clean shutdown (close frame exchanged or local close).
    Normal,
    /// Transport-level failure (reset, protocol error).
    Error,
    /// The connection timed out.
    Timeout,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_channel_error_display() {
        let error = ChannelError::Connect("connection refused".to_string());
        assert_eq!(error.to_string(), "Connect error: connection refused");

        let error = ChannelError::NotOpen;
        assert_eq!(error.to_string(), "Channel not open");

        let error = ChannelError::NotConnected;
        assert_eq!(error.to_string(), "Not connected");
    }

    #[rstest]
    fn test_channel_error_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json")
            .expect_err("should fail to parse");
        let error = ChannelError::from(json_err);

        assert!(matches!(error, ChannelError::Json(_)));
    }

    #[rstest]
    #[case(CloseReason::Normal, "normal")]
    #[case(CloseReason::Error, "error")]
    #[case(CloseReason::Timeout, "timeout")]
    fn test_close_reason_display(#[case] reason: CloseReason, #[case] expected: &str) {
        assert_eq!(reason.to_string(), expected);
    }
}
