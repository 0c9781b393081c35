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

//! Message types exchanged over the real-time channel.
//!
//! Every message is wrapped in an [`Envelope`] carrying a mandatory event type,
//! an opaque JSON payload, and an optional timestamp. Inbound envelopes accept
//! both wire forms the backend produces: payload fields nested under `"data"`,
//! or free-form fields merged at the top level next to `"type"`. Outbound
//! envelopes always nest the payload under `"data"`.

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::Error as DeError,
    ser::SerializeMap,
};
use serde_json::Value;
use strum::Display;
use ustr::Ustr;

/// The wire unit exchanged in both directions over the real-time channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// The event type, always present and non-empty.
    pub event_type: Ustr,
    /// The opaque JSON payload.
    pub payload: Value,
    /// Optional origination timestamp (RFC 3339 string).
    pub timestamp: Option<String>,
}

impl Envelope {
    /// Creates a new [`Envelope`] with the given event type and payload.
    #[must_use]
    pub fn new<T: AsRef<str>>(event_type: T, payload: Value) -> Self {
        Self {
            event_type: Ustr::from(event_type.as_ref()),
            payload,
            timestamp: None,
        }
    }

    /// Sets the origination timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: String) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Parses an envelope from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object or the `type` field
    /// is missing, empty, or not a string.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serializes the envelope to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 2 + usize::from(self.timestamp.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("type", self.event_type.as_str())?;
        map.serialize_entry("data", &self.payload)?;
        if let Some(timestamp) = &self.timestamp {
            map.serialize_entry("timestamp", timestamp)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = serde_json::Map::deserialize(deserializer)?;

        let event_type = match fields.remove("type") {
            Some(Value::String(s)) if !s.is_empty() => Ustr::from(s.as_str()),
            Some(Value::String(_)) => {
                return Err(DeError::custom("envelope `type` must be non-empty"));
            }
            Some(_) => return Err(DeError::custom("envelope `type` must be a string")),
            None => return Err(DeError::custom("envelope missing `type` field")),
        };

        let timestamp = match fields.remove("timestamp") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => {
                // Non-string timestamps stay in the payload untouched
                fields.insert("timestamp".to_string(), other);
                None
            }
        };

        let payload = match fields.remove("data") {
            Some(value) => value,
            None => Value::Object(fields),
        };

        Ok(Self {
            event_type,
            payload,
            timestamp,
        })
    }
}

/// Connection lifecycle events exposed to application code.
#[derive(Clone, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleEvent {
    /// The channel reached the open state (initial connect or recovery).
    ///
    /// Consumers use this to trigger a full resynchronization fetch; the
    /// supervisor does not replay messages missed across a disconnect gap.
    Connected,
    /// The channel left the open state.
    Disconnected,
    /// A transport or connect error occurred (recovered internally).
    Error(String),
    /// Reconnection attempts are exhausted; the supervisor is now failed
    /// until an explicit restart.
    MaxReconnectAttemptsReached,
}
