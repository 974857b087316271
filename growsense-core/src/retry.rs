//! Bounded retry for flaky register access
//!
//! Some devices (the LTR-559 in particular) NAK the odd transfer right after
//! power-up or while an on-chip reset is in progress. [`Retry`] re-runs one
//! register access a fixed number of times with a fixed backoff, logging each
//! failure, and gives up with [`SensorError::PersistentTransport`].
//!
//! [`RetryingBus`] applies the same policy to every transfer of a wrapped
//! [`BusTransport`], so a driver built on it needs no retry code of its own.
//!
//! ```rust
//! use growsense_core::{BusOp, Retry, TransportError};
//! # struct NoDelay;
//! # impl embedded_hal::delay::DelayNs for NoDelay { fn delay_ns(&mut self, _: u32) {} }
//!
//! let mut failures = 2;
//! let outcome = Retry::default().run(&mut NoDelay, 0x86, BusOp::Read, || {
//!     if failures > 0 {
//!         failures -= 1;
//!         Err(TransportError::NoAcknowledge)
//!     } else {
//!         Ok(0x92)
//!     }
//! })?;
//!
//! assert_eq!(outcome.value, 0x92);
//! assert_eq!(outcome.attempts, 3);
//! # Ok::<(), growsense_core::SensorError>(())
//! ```

use embedded_hal::delay::DelayNs;

use crate::{
    constants::time::{RETRY_ATTEMPTS, RETRY_BACKOFF_MS},
    errors::{BusOp, SensorError, SensorResult, TransportError},
    traits::BusTransport,
};

/// Retry policy: how many attempts and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Retry {
    /// Total attempts, including the first; 0 is treated as 1
    pub attempts: u8,
    /// Pause after each failed attempt except the last
    pub backoff_ms: u32,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            attempts: RETRY_ATTEMPTS,
            backoff_ms: RETRY_BACKOFF_MS,
        }
    }
}

/// A value together with the attempts it took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retried<T> {
    /// Result of the successful attempt
    pub value: T,
    /// Attempts used, 1 if the first one succeeded
    pub attempts: u8,
}

impl Retry {
    /// Policy with explicit limits
    pub const fn new(attempts: u8, backoff_ms: u32) -> Self {
        Self { attempts, backoff_ms }
    }

    /// Run `access` until it succeeds or the budget is spent
    ///
    /// Exhaustion is reported as [`TransportError::RetriesExhausted`], which
    /// is what lets [`RetryingBus`] stay a plain [`BusTransport`].
    pub fn attempt<T, D, F>(
        &self,
        delay: &mut D,
        register: u8,
        op: BusOp,
        mut access: F,
    ) -> Result<Retried<T>, TransportError>
    where
        D: DelayNs,
        F: FnMut() -> Result<T, TransportError>,
    {
        let budget = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match access() {
                Ok(value) => return Ok(Retried { value, attempts: attempt }),
                Err(cause) => {
                    log_warn!(
                        "{} of register {:#04x} failed (attempt {}/{}): {}",
                        op, register, attempt, budget, cause
                    );
                    if attempt >= budget {
                        return Err(TransportError::RetriesExhausted { attempts: attempt });
                    }
                    delay.delay_ms(self.backoff_ms);
                    attempt += 1;
                }
            }
        }
    }

    /// Run `access` with retries, failing with a register-level error
    pub fn run<T, D, F>(&self, delay: &mut D, register: u8, op: BusOp, access: F) -> SensorResult<Retried<T>>
    where
        D: DelayNs,
        F: FnMut() -> Result<T, TransportError>,
    {
        self.attempt(delay, register, op, access)
            .map_err(|cause| SensorError::transport(register, op, cause))
    }
}

/// [`BusTransport`] decorator applying a [`Retry`] policy to every transfer
#[derive(Debug)]
pub struct RetryingBus<B, D> {
    inner: B,
    delay: D,
    policy: Retry,
    attempts_used: u32,
}

impl<B: BusTransport, D: DelayNs> RetryingBus<B, D> {
    /// Wrap `inner`, sleeping on `delay` between attempts
    pub fn new(inner: B, delay: D, policy: Retry) -> Self {
        Self {
            inner,
            delay,
            policy,
            attempts_used: 0,
        }
    }

    /// Policy in effect
    pub fn policy(&self) -> Retry {
        self.policy
    }

    /// Attempts made across all transfers so far, successful or not
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    /// The delay provider, for callers that need to sleep between transfers
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Unwrap into the inner bus and delay
    pub fn release(self) -> (B, D) {
        (self.inner, self.delay)
    }

    fn account<T>(&mut self, result: Result<Retried<T>, TransportError>) -> Result<T, TransportError> {
        match result {
            Ok(done) => {
                self.attempts_used += done.attempts as u32;
                Ok(done.value)
            }
            Err(TransportError::RetriesExhausted { attempts }) => {
                self.attempts_used += attempts as u32;
                Err(TransportError::RetriesExhausted { attempts })
            }
            Err(other) => Err(other),
        }
    }
}

impl<B: BusTransport, D: DelayNs> BusTransport for RetryingBus<B, D> {
    fn write_block(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
        let Self { inner, delay, policy, .. } = self;
        let result = policy.attempt(delay, register, BusOp::Write, || inner.write_block(address, register, bytes));
        self.account(result)
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        let Self { inner, delay, policy, .. } = self;
        let result = policy.attempt(delay, register, BusOp::Read, || inner.read_block(address, register, buf));
        self.account(result)
    }
}
