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

//! Transport layer for the real-time channel.
//!
//! [`ChannelTransport`] is a thin, testable seam over one underlying
//! bidirectional connection: it can open a channel, and an open channel can
//! send envelopes and surfaces inbound messages plus exactly one terminal
//! [`TransportEvent::Closed`] per open attempt. No retry logic lives here;
//! the connection supervisor owns all recovery decisions.

use std::fmt::Debug;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

use crate::{
    error::{ChannelError, CloseReason},
    messages::Envelope,
};

/// Raw event surfaced by an open transport channel.
#[derive(Debug)]
pub enum TransportEvent {
    /// An inbound envelope, delivered in arrival order.
    Message(Envelope),
    /// The channel terminated; emitted exactly once per open attempt.
    Closed(CloseReason),
}

/// The outbound half of one open channel.
#[async_trait]
pub trait ChannelSink: Send + Debug {
    /// Sends an envelope over the open channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] if the channel was closed locally,
    /// or [`ChannelError::Channel`] on transport failure.
    async fn send(&mut self, envelope: &Envelope) -> Result<(), ChannelError>;

    /// Closes the channel. Idempotent and always succeeds.
    async fn close(&mut self);
}

/// One successfully opened channel: an outbound sink plus the inbound event
/// stream for this connection only.
#[derive(Debug)]
pub struct OpenChannel {
    /// Outbound half.
    pub sink: Box<dyn ChannelSink>,
    /// Inbound events in arrival order, terminated by one `Closed`.
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Owns the ability to open one underlying bidirectional connection.
#[async_trait]
pub trait ChannelTransport: Send + Sync + Debug {
    /// Opens a new channel to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Connect`] on a malformed URL or immediate
    /// refusal.
    async fn open(&self, url: &str) -> Result<OpenChannel, ChannelError>;
}

/// WebSocket implementation of [`ChannelTransport`] over tokio-tungstenite.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsTransport;

#[async_trait]
impl ChannelTransport for WsTransport {
    async fn open(&self, url: &str) -> Result<OpenChannel, ChannelError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        tracing::debug!("WebSocket channel opened: {url}");

        let (sink, mut stream) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel::<TransportEvent>();

        tokio::spawn(async move {
            let mut reason = CloseReason::Normal;
            while let Some(item) = stream.next().await {
                match item {
                    Ok(Message::Text(text)) => match Envelope::from_json(&text) {
                        Ok(envelope) => {
                            if tx.send(TransportEvent::Message(envelope)).is_err() {
                                // Receiver dropped; connection abandoned
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Dropping undecodable message: {e} | text: {text}");
                        }
                    },
                    Ok(Message::Binary(data)) => {
                        tracing::debug!("Ignoring binary frame ({} bytes)", data.len());
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(frame)) => {
                        tracing::debug!("Received close frame: {frame:?}");
                        break;
                    }
                    Ok(Message::Frame(_)) => {
                        tracing::warn!("Received raw frame (unexpected)");
                    }
                    Err(e) => {
                        tracing::warn!("WebSocket stream error: {e}");
                        reason = CloseReason::Error;
                        break;
                    }
                }
            }
            let _ = tx.send(TransportEvent::Closed(reason));
            tracing::debug!("WebSocket reader finished: {reason}");
        });

        Ok(OpenChannel {
            sink: Box::new(WsSink {
                inner: sink,
                closed: false,
            }),
            events: rx,
        })
    }
}

#[derive(Debug)]
struct WsSink {
    inner: SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>,
    closed: bool,
}

#[async_trait]
impl ChannelSink for WsSink {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::NotOpen);
        }
        let json = envelope.to_json()?;
        tracing::trace!("Sending envelope: {json}");
        self.inner
            .send(Message::text(json))
            .await
            .map_err(|e| ChannelError::Channel(e.to_string()))
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.inner.send(Message::Close(None)).await {
                tracing::debug!("Error sending close frame: {e}");
            }
            let _ = self.inner.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn test_open_rejects_malformed_url() {
        let result = WsTransport.open("not a url").await;

        assert!(matches!(result, Err(ChannelError::Connect(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_open_rejects_refused_connection() {
        // Port 9 (discard) is assumed unbound
        let result = WsTransport.open("ws://127.0.0.1:9/ws").await;

        assert!(matches!(result, Err(ChannelError::Connect(_))));
    }
}
