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

//! Test support: a scriptable in-memory transport and async wait helpers.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::{
    error::{ChannelError, CloseReason},
    messages::Envelope,
    transport::{ChannelSink, ChannelTransport, OpenChannel, TransportEvent},
};

#[derive(Debug)]
enum MockOutcome {
    Fail,
    Hold(oneshot::Receiver<()>),
}

#[derive(Debug, Default)]
struct MockState {
    connect_calls: usize,
    outcomes: VecDeque<MockOutcome>,
    current: Option<mpsc::UnboundedSender<TransportEvent>>,
}

/// Scriptable [`ChannelTransport`] for supervisor and application tests.
///
/// Every `open` succeeds unless scripted otherwise via [`Self::fail_next`] or
/// [`Self::hold_next`]. Inbound traffic and remote closes are driven from the
/// test through [`Self::emit_message`] and [`Self::close_current`].
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    sent: Arc<Mutex<Vec<Envelope>>>,
}

impl MockTransport {
    /// Creates a new [`MockTransport`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scripts the next `n` open attempts to fail with a refusal.
    pub fn fail_next(&self, n: usize) {
        let mut state = self.lock();
        for _ in 0..n {
            state.outcomes.push_back(MockOutcome::Fail);
        }
    }

    /// Scripts the next open attempt to block until the returned sender
    /// fires; dropping the sender fails the attempt.
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().outcomes.push_back(MockOutcome::Hold(rx));
        tx
    }

    /// Returns how many open attempts have been made.
    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.lock().connect_calls
    }

    /// Returns every envelope sent across all connections, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivers an inbound envelope on the current connection.
    ///
    /// Returns whether a live connection received it.
    pub fn emit_message(&self, envelope: Envelope) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|tx| tx.send(TransportEvent::Message(envelope)).is_ok())
    }

    /// Terminates the current connection with the given reason (simulated
    /// remote close).
    pub fn close_current(&self, reason: CloseReason) {
        let mut state = self.lock();
        if let Some(tx) = state.current.take() {
            let _ = tx.send(TransportEvent::Closed(reason));
        }
    }
}

#[async_trait]
impl ChannelTransport for MockTransport {
    async fn open(&self, _url: &str) -> Result<OpenChannel, ChannelError> {
        let outcome = {
            let mut state = self.lock();
            state.connect_calls += 1;
            state.outcomes.pop_front()
        };

        match outcome {
            Some(MockOutcome::Fail) => {
                return Err(ChannelError::Connect("mock connect refused".to_string()));
            }
            Some(MockOutcome::Hold(rx)) => {
                if rx.await.is_err() {
                    return Err(ChannelError::Connect("mock connect abandoned".to_string()));
                }
            }
            None => {}
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().current = Some(tx);

        Ok(OpenChannel {
            sink: Box::new(MockSink {
                sent: Arc::clone(&self.sent),
                closed: false,
            }),
            events: rx,
        })
    }
}

#[derive(Debug)]
struct MockSink {
    sent: Arc<Mutex<Vec<Envelope>>>,
    closed: bool,
}

#[async_trait]
impl ChannelSink for MockSink {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::NotOpen);
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope.clone());
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Polls `condition` until it returns true or `timeout` elapses.
///
/// # Panics
///
/// Panics when the timeout elapses first.
pub async fn wait_until_async<F>(mut condition: F, timeout: Duration)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
