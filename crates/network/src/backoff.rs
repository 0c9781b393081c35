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

//! Exponential backoff policy for reconnection attempts.
//!
//! The policy is pure computation: given an attempt count it returns the next
//! delay and whether to give up. It owns no timers and performs no I/O; the
//! connection supervisor owns all scheduling.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Default initial reconnection delay.
pub const DEFAULT_DELAY_INITIAL_MS: u64 = 1_000;
/// Default maximum reconnection delay (backoff cap).
pub const DEFAULT_DELAY_MAX_MS: u64 = 30_000;
/// Default maximum number of consecutive failed attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default jitter applied to each delay (fraction of the raw delay).
pub const DEFAULT_JITTER_RATIO: f64 = 0.2;

/// Computes reconnection delays with exponential backoff and jitter.
///
/// The raw delay for attempt `n` (zero-based) is `min(initial * 2^n, max)`;
/// jitter of up to ±20% is then applied to avoid thundering-herd reconnects.
#[derive(Debug)]
pub struct ReconnectPolicy {
    delay_initial: Duration,
    delay_max: Duration,
    max_attempts: u32,
    jitter_ratio: f64,
    rng: StdRng,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_DELAY_INITIAL_MS),
            Duration::from_millis(DEFAULT_DELAY_MAX_MS),
            DEFAULT_MAX_ATTEMPTS,
        )
    }
}

impl ReconnectPolicy {
    /// Creates a new [`ReconnectPolicy`] with an OS-seeded jitter source.
    #[must_use]
    pub fn new(delay_initial: Duration, delay_max: Duration, max_attempts: u32) -> Self {
        Self {
            delay_initial,
            delay_max,
            max_attempts,
            jitter_ratio: DEFAULT_JITTER_RATIO,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a new [`ReconnectPolicy`] with a deterministic jitter source.
    #[must_use]
    pub fn with_seed(
        delay_initial: Duration,
        delay_max: Duration,
        max_attempts: u32,
        seed: u64,
    ) -> Self {
        Self {
            delay_initial,
            delay_max,
            max_attempts,
            jitter_ratio: DEFAULT_JITTER_RATIO,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns the raw (un-jittered) delay for the given zero-based attempt.
    #[must_use]
    pub fn raw_delay(&self, attempt: u32) -> Duration {
        let initial_ms = self.delay_initial.as_millis() as u64;
        let max_ms = self.delay_max.as_millis() as u64;
        let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let raw_ms = initial_ms.saturating_mul(factor).min(max_ms);
        Duration::from_millis(raw_ms)
    }

    /// Returns the jittered delay for the given zero-based attempt.
    pub fn delay(&mut self, attempt: u32) -> Duration {
        let raw_ms = self.raw_delay(attempt).as_millis() as f64;
        let jitter: f64 = self.rng.random_range(-self.jitter_ratio..=self.jitter_ratio);
        Duration::from_millis((raw_ms * (1.0 + jitter)).round() as u64)
    }

    /// Returns whether reconnection should be abandoned after `failures`
    /// consecutive failed connect attempts.
    #[must_use]
    pub const fn give_up(&self, failures: u32) -> bool {
        failures >= self.max_attempts
    }

    /// Returns the configured maximum attempt count.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
