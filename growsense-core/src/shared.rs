//! Sharing devices and buses between threads
//!
//! Two levels of serialisation:
//!
//! - [`SharedDevice`] wraps a whole driver. Holding its lock covers a full
//!   acquisition (config write, wait, result read), so concurrent callers on
//!   one ADC never interleave their register traffic.
//! - [`SharedBus`] wraps a bus transport and locks per transfer. Several
//!   drivers on one Linux I2C adapter can each own a clone.
//!
//! A poisoned lock is recovered rather than propagated: the guarded value is
//! a driver whose state machine already returns to idle on error.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{errors::TransportError, traits::BusTransport};

/// A driver shared between threads, one operation at a time
#[derive(Debug)]
pub struct SharedDevice<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SharedDevice<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> SharedDevice<T> {
    /// Take ownership of a driver
    pub fn new(device: T) -> Self {
        Self { inner: Arc::new(Mutex::new(device)) }
    }

    /// Lock the device for a sequence of operations
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` with exclusive access
    pub fn with<R>(&self, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut self.lock())
    }
}

/// A bus transport shared between drivers, locked per transfer
#[derive(Debug)]
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<B> SharedBus<B> {
    /// Take ownership of a bus
    pub fn new(bus: B) -> Self {
        Self { inner: Arc::new(Mutex::new(bus)) }
    }

    fn lock(&self) -> MutexGuard<'_, B> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: BusTransport> BusTransport for SharedBus<B> {
    fn write_block(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
        self.lock().write_block(address, register, bytes)
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        self.lock().read_block(address, register, buf)
    }
}
