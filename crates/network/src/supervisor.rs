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

//! Connection supervisor driving the channel state machine.
//!
//! The supervisor owns one [`ChannelTransport`] and one [`ReconnectPolicy`]
//! and is the single authoritative owner of retry decisions. All state
//! transitions, timer callbacks, and inbound-message handling run as discrete
//! steps on one actor task, so no transition can be observed mid-update.
//!
//! On every transition into [`ConnectionState::Open`] a
//! [`LifecycleEvent::Connected`] is emitted; external state owners use it to
//! re-fetch authoritative state. The supervisor deliberately does not buffer
//! or replay messages missed across a disconnect gap.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use strum::{AsRefStr, Display};
use tokio::sync::{broadcast, mpsc, watch};

use crate::{
    backoff::{
        DEFAULT_DELAY_INITIAL_MS, DEFAULT_DELAY_MAX_MS, DEFAULT_MAX_ATTEMPTS, ReconnectPolicy,
    },
    error::ChannelError,
    messages::{Envelope, LifecycleEvent},
    router::EventRouter,
    transport::{ChannelSink, ChannelTransport, OpenChannel, TransportEvent},
};

/// Default timeout for a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default bound of the pending-send queue.
pub const DEFAULT_SEND_QUEUE_MAX: usize = 50;

/// The connection state of a [`ConnectionSupervisor`].
///
/// Exactly one instance per supervisor; transitions are serialized on the
/// supervisor task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none being attempted.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The channel is open; sends are forwarded immediately.
    Open,
    /// A local close is in progress.
    Closing,
    /// Waiting out the backoff delay before the next attempt.
    Reconnecting,
    /// Reconnect attempts exhausted; terminal until an explicit start.
    Failed,
}

/// Configuration for a [`ConnectionSupervisor`].
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// The URL to connect to.
    pub url: String,
    /// The timeout (milliseconds) for a single connect attempt.
    pub connect_timeout_ms: u64,
    /// The initial reconnection delay (milliseconds).
    pub reconnect_delay_initial_ms: u64,
    /// The maximum reconnection delay (milliseconds) for exponential backoff.
    pub reconnect_delay_max_ms: u64,
    /// The maximum number of consecutive failed attempts before giving up.
    pub reconnect_max_attempts: u32,
    /// Bound of the queue holding sends issued while not open (drop-oldest).
    pub send_queue_max: usize,
    /// Optional seed for the backoff jitter source (deterministic tests).
    pub backoff_seed: Option<u64>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080".to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            reconnect_delay_initial_ms: DEFAULT_DELAY_INITIAL_MS,
            reconnect_delay_max_ms: DEFAULT_DELAY_MAX_MS,
            reconnect_max_attempts: DEFAULT_MAX_ATTEMPTS,
            send_queue_max: DEFAULT_SEND_QUEUE_MAX,
            backoff_seed: None,
        }
    }
}

/// Commands sent from the public handle to the supervisor task.
#[derive(Debug)]
enum Command {
    Start,
    Stop,
    Send(Envelope),
}

/// Public handle to the supervisor task.
///
/// Constructed once at application start and torn down on full logout; the
/// task exits when the handle is dropped.
#[derive(Debug)]
pub struct ConnectionSupervisor {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
    _task: tokio::task::JoinHandle<()>,
}

impl ConnectionSupervisor {
    /// Creates a new [`ConnectionSupervisor`] and spawns its task.
    ///
    /// No connection is attempted until [`Self::start`] is called or a
    /// credential appears on the optional `credentials` watch. Revoking the
    /// credential is an authoritative instruction to close and not retry.
    #[must_use]
    pub fn new(
        config: SupervisorConfig,
        transport: Arc<dyn ChannelTransport>,
        router: EventRouter,
        credentials: Option<watch::Receiver<Option<String>>>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (lifecycle_tx, _) = broadcast::channel(128);

        let delay_initial = Duration::from_millis(config.reconnect_delay_initial_ms);
        let delay_max = Duration::from_millis(config.reconnect_delay_max_ms);
        let policy = match config.backoff_seed {
            Some(seed) => ReconnectPolicy::with_seed(
                delay_initial,
                delay_max,
                config.reconnect_max_attempts,
                seed,
            ),
            None => ReconnectPolicy::new(delay_initial, delay_max, config.reconnect_max_attempts),
        };

        let actor = SupervisorActor {
            config,
            transport,
            router,
            policy,
            cmd_rx,
            state_tx,
            lifecycle_tx: lifecycle_tx.clone(),
            credentials,
            attempts: 0,
            queue: VecDeque::new(),
        };
        let task = tokio::spawn(actor.run());

        Self {
            cmd_tx,
            state_rx,
            lifecycle_tx,
            _task: task,
        }
    }

    /// Requests a connection (Idle/Failed to Connecting).
    pub fn start(&self) {
        let _ = self.cmd_tx.send(Command::Start);
    }

    /// Requests teardown, cancelling any in-flight attempt or pending
    /// reconnect timer.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(Command::Stop);
    }

    /// Sends an envelope over the channel.
    ///
    /// While Open the envelope is forwarded in call order; while
    /// Connecting/Reconnecting it is queued (bounded, drop-oldest) for flush
    /// on the next Open.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotConnected`] while Idle, Closing, or Failed,
    /// or [`ChannelError::Channel`] if the supervisor task has terminated.
    pub fn send(&self, envelope: Envelope) -> Result<(), ChannelError> {
        match *self.state_rx.borrow() {
            ConnectionState::Open
            | ConnectionState::Connecting
            | ConnectionState::Reconnecting => self
                .cmd_tx
                .send(Command::Send(envelope))
                .map_err(|_| ChannelError::Channel("supervisor task terminated".to_string())),
            _ => Err(ChannelError::NotConnected),
        }
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Returns a watch receiver observing state transitions.
    #[must_use]
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Returns a new receiver of lifecycle events.
    #[must_use]
    pub fn lifecycle_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle_tx.subscribe()
    }

    /// Returns whether the channel is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }
}

/// Internal phase of the supervisor task; [`Phase::Open`] carries the live
/// channel, which never escapes the task.
enum Phase {
    Idle,
    Connecting,
    Open(OpenChannel),
    Reconnecting(Duration),
    Failed,
    Terminated,
}

struct SupervisorActor {
    config: SupervisorConfig,
    transport: Arc<dyn ChannelTransport>,
    router: EventRouter,
    policy: ReconnectPolicy,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
    credentials: Option<watch::Receiver<Option<String>>>,
    attempts: u32,
    queue: VecDeque<Envelope>,
}

/// Resolves on the next credential change, yielding whether a token is now
/// present. Pends forever when no credential watch is configured or its
/// producer is gone.
async fn credential_change(credentials: &mut Option<watch::Receiver<Option<String>>>) -> bool {
    match credentials {
        Some(rx) => match rx.changed().await {
            Ok(()) => rx.borrow_and_update().is_some(),
            Err(_) => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

impl SupervisorActor {
    async fn run(mut self) {
        let mut phase = Phase::Idle;
        loop {
            phase = match phase {
                Phase::Idle => self.wait_start(ConnectionState::Idle).await,
                Phase::Failed => self.wait_start(ConnectionState::Failed).await,
                Phase::Connecting => self.connect().await,
                Phase::Open(channel) => self.open_loop(channel).await,
                Phase::Reconnecting(delay) => self.await_reconnect(delay).await,
                Phase::Terminated => break,
            };
        }
        tracing::debug!("Connection supervisor task finished");
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!("Connection state: {previous} -> {state}");
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        let _ = self.lifecycle_tx.send(event);
    }

    fn enqueue(&mut self, envelope: Envelope) {
        if self.queue.len() >= self.config.send_queue_max {
            if let Some(dropped) = self.queue.pop_front() {
                tracing::warn!(
                    "Send queue full ({}), dropping oldest envelope '{}'",
                    self.config.send_queue_max,
                    dropped.event_type
                );
            }
        }
        self.queue.push_back(envelope);
    }

    /// Local teardown toward Idle; resets the attempt counter and discards
    /// any queued sends.
    fn enter_idle(&mut self, from_open: bool) -> Phase {
        if from_open {
            self.set_state(ConnectionState::Closing);
            self.emit(LifecycleEvent::Disconnected);
        }
        self.attempts = 0;
        if !self.queue.is_empty() {
            tracing::debug!("Discarding {} queued envelopes on stop", self.queue.len());
            self.queue.clear();
        }
        Phase::Idle
    }

    /// Idle/Failed: wait for a start instruction (explicit or via credential
    /// grant).
    async fn wait_start(&mut self, state: ConnectionState) -> Phase {
        self.set_state(state);
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    None => return Phase::Terminated,
                    Some(Command::Start) => {
                        self.attempts = 0;
                        return Phase::Connecting;
                    }
                    Some(Command::Stop) => {
                        if state == ConnectionState::Failed {
                            return Phase::Idle;
                        }
                    }
                    Some(Command::Send(envelope)) => {
                        // The public handle rejects sends in this state; a
                        // command can still race a transition
                        tracing::debug!(
                            "Discarding send while {state}: '{}'",
                            envelope.event_type
                        );
                    }
                },
                present = credential_change(&mut self.credentials) => {
                    if present {
                        self.attempts = 0;
                        return Phase::Connecting;
                    }
                    if state == ConnectionState::Failed {
                        return Phase::Idle;
                    }
                }
            }
        }
    }

    /// Drives one connect attempt, staying responsive to commands.
    async fn connect(&mut self) -> Phase {
        self.set_state(ConnectionState::Connecting);

        let transport = Arc::clone(&self.transport);
        let url = self.config.url.clone();
        let timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let open_fut = async move { tokio::time::timeout(timeout, transport.open(&url)).await };
        tokio::pin!(open_fut);

        loop {
            tokio::select! {
                result = &mut open_fut => {
                    return match result {
                        Ok(Ok(channel)) => self.on_open(channel).await,
                        Ok(Err(e)) => self.on_connect_failure(e.to_string()),
                        Err(_) => self.on_connect_failure(format!(
                            "connect timed out after {}ms",
                            self.config.connect_timeout_ms
                        )),
                    };
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    None => return Phase::Terminated,
                    Some(Command::Stop) => return self.enter_idle(false),
                    Some(Command::Start) => {}
                    Some(Command::Send(envelope)) => self.enqueue(envelope),
                },
                present = credential_change(&mut self.credentials) => {
                    if !present {
                        tracing::info!("Credential revoked, abandoning connect attempt");
                        return self.enter_idle(false);
                    }
                }
            }
        }
    }

    async fn on_open(&mut self, mut channel: OpenChannel) -> Phase {
        self.attempts = 0;
        self.set_state(ConnectionState::Open);
        self.emit(LifecycleEvent::Connected);

        if let Err(e) = self.flush_queue(&mut channel.sink).await {
            // The channel's terminal Closed event drives the reconnect
            tracing::warn!("Flush after connect failed: {e}");
        }
        Phase::Open(channel)
    }

    /// Flushes queued sends in original order; on failure the unsent
    /// remainder stays queued for the next open.
    async fn flush_queue(&mut self, sink: &mut Box<dyn ChannelSink>) -> Result<(), ChannelError> {
        if !self.queue.is_empty() {
            tracing::debug!("Flushing {} queued envelopes", self.queue.len());
        }
        while let Some(envelope) = self.queue.pop_front() {
            if let Err(e) = sink.send(&envelope).await {
                self.queue.push_front(envelope);
                return Err(e);
            }
        }
        Ok(())
    }

    fn on_connect_failure(&mut self, detail: String) -> Phase {
        self.attempts += 1;
        tracing::warn!("Connect attempt {} failed: {detail}", self.attempts);
        self.emit(LifecycleEvent::Error(detail));

        if self.policy.give_up(self.attempts) {
            tracing::error!(
                "Max reconnect attempts ({}) reached, giving up",
                self.policy.max_attempts()
            );
            self.emit(LifecycleEvent::MaxReconnectAttemptsReached);
            Phase::Failed
        } else {
            Phase::Reconnecting(self.policy.delay(self.attempts - 1))
        }
    }

    /// Open: route inbound envelopes, forward sends, watch for the terminal
    /// close.
    async fn open_loop(&mut self, mut channel: OpenChannel) -> Phase {
        loop {
            tokio::select! {
                event = channel.events.recv() => match event {
                    Some(TransportEvent::Message(envelope)) => self.router.route(&envelope),
                    Some(TransportEvent::Closed(reason)) => {
                        tracing::warn!("Channel closed: {reason}");
                        self.emit(LifecycleEvent::Disconnected);
                        return Phase::Reconnecting(self.policy.delay(self.attempts));
                    }
                    None => {
                        tracing::warn!("Channel event stream ended unexpectedly");
                        self.emit(LifecycleEvent::Disconnected);
                        return Phase::Reconnecting(self.policy.delay(self.attempts));
                    }
                },
                cmd = self.cmd_rx.recv() => match cmd {
                    None => {
                        channel.sink.close().await;
                        return Phase::Terminated;
                    }
                    Some(Command::Stop) => {
                        channel.sink.close().await;
                        return self.enter_idle(true);
                    }
                    Some(Command::Start) => {}
                    Some(Command::Send(envelope)) => {
                        if let Err(e) = channel.sink.send(&envelope).await {
                            tracing::warn!("Send failed, queueing envelope: {e}");
                            self.enqueue(envelope);
                        }
                    }
                },
                present = credential_change(&mut self.credentials) => {
                    if !present {
                        tracing::info!("Credential revoked, closing channel");
                        channel.sink.close().await;
                        return self.enter_idle(true);
                    }
                }
            }
        }
    }

    /// Reconnecting: wait out the backoff delay; a stop cancels the timer and
    /// moves directly to Idle.
    async fn await_reconnect(&mut self, delay: Duration) -> Phase {
        self.set_state(ConnectionState::Reconnecting);
        tracing::info!(
            "Reconnecting in {delay:?} (attempt {} of {})",
            self.attempts + 1,
            self.policy.max_attempts()
        );

        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                () = &mut timer => return Phase::Connecting,
                cmd = self.cmd_rx.recv() => match cmd {
                    None => return Phase::Terminated,
                    Some(Command::Stop) => return self.enter_idle(false),
                    Some(Command::Start) => return Phase::Connecting,
                    Some(Command::Send(envelope)) => self.enqueue(envelope),
                },
                present = credential_change(&mut self.credentials) => {
                    if !present {
                        tracing::info!("Credential revoked, cancelling reconnect");
                        return self.enter_idle(false);
                    }
                }
            }
        }
    }
}
