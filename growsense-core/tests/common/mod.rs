//! Common test doubles for integration tests
//!
//! This module provides:
//! - A register-file bus that records every transfer
//! - Scripted reads and failure injection per register
//! - Delay providers that account time instead of sleeping

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use embedded_hal::delay::DelayNs;
use growsense_core::{BusOp, BusTransport, TransportError};

/// One recorded transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub address: u8,
    pub register: u8,
    pub op: BusOp,
    pub bytes: Vec<u8>,
}

/// In-memory register file for any number of devices
///
/// Block reads auto-increment from the start register, like the real parts.
/// Scripted reads for a register take priority over the register file, and
/// injected failures take priority over both.
#[derive(Debug, Default)]
pub struct RegisterBus {
    registers: HashMap<(u8, u8), u8>,
    scripted: HashMap<(u8, u8), VecDeque<Vec<u8>>>,
    failures: HashMap<(u8, u8, BusOp), u32>,
    pub log: Vec<Transfer>,
}

impl RegisterBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload consecutive registers starting at `register`
    pub fn set(&mut self, address: u8, register: u8, bytes: &[u8]) -> &mut Self {
        for (i, byte) in bytes.iter().enumerate() {
            self.registers.insert((address, register.wrapping_add(i as u8)), *byte);
        }
        self
    }

    /// Queue a reply for the next read of `register`
    pub fn script(&mut self, address: u8, register: u8, bytes: &[u8]) -> &mut Self {
        self.scripted.entry((address, register)).or_default().push_back(bytes.to_vec());
        self
    }

    /// Make the next `times` transfers of this kind fail with a NAK
    pub fn fail(&mut self, address: u8, register: u8, op: BusOp, times: u32) -> &mut Self {
        self.failures.insert((address, register, op), times);
        self
    }

    pub fn writes(&self) -> Vec<&Transfer> {
        self.log.iter().filter(|t| t.op == BusOp::Write).collect()
    }

    pub fn reads_of(&self, register: u8) -> usize {
        self.log.iter().filter(|t| t.op == BusOp::Read && t.register == register).count()
    }

    fn take_failure(&mut self, address: u8, register: u8, op: BusOp) -> bool {
        match self.failures.get_mut(&(address, register, op)) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl BusTransport for RegisterBus {
    fn write_block(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
        self.log.push(Transfer { address, register, op: BusOp::Write, bytes: bytes.to_vec() });
        if self.take_failure(address, register, BusOp::Write) {
            return Err(TransportError::NoAcknowledge);
        }
        self.set(address, register, bytes);
        Ok(())
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        if self.take_failure(address, register, BusOp::Read) {
            self.log.push(Transfer { address, register, op: BusOp::Read, bytes: vec![] });
            return Err(TransportError::NoAcknowledge);
        }

        let scripted = self
            .scripted
            .get_mut(&(address, register))
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(reply) => buf.copy_from_slice(&reply[..buf.len()]),
            None => {
                for (i, byte) in buf.iter_mut().enumerate() {
                    *byte = *self
                        .registers
                        .get(&(address, register.wrapping_add(i as u8)))
                        .unwrap_or(&0);
                }
            }
        }
        self.log.push(Transfer { address, register, op: BusOp::Read, bytes: buf.to_vec() });
        Ok(())
    }
}

/// Queue raw ADS1115 results for the conversion register, high byte first
pub fn script_conversions(bus: &mut RegisterBus, address: u8, results: &[i16]) {
    for value in results {
        bus.script(address, 0x00, &value.to_be_bytes());
    }
}

/// Delay that only adds up the time asked for
#[derive(Debug, Default, Clone)]
pub struct ClockDelay {
    pub total_ns: u64,
    pub calls_ms: Vec<u32>,
}

impl ClockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for ClockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls_ms.push(ms);
        self.total_ns += ms as u64 * 1_000_000;
    }
}

/// Delay that returns immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
