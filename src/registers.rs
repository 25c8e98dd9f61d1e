//! Simulated memory-mapped register bank.
//!
//! Every field is a single 32-bit word accessed with sequentially consistent
//! atomics, so a reader sees either the old or the new value and accesses are
//! never reordered across each other. On real hardware these would be
//! volatile reads and writes to fixed addresses.

use bitflags::bitflags;
use core::sync::atomic::{AtomicU32, Ordering};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

bitflags! {
    /// Bit layout of the `control` register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlBits: u32 {
        /// Actuation path is live.
        const ENABLE = 1 << 0;
        /// Hardware-reported fault, independent of software state.
        const FAULT  = 1 << 1;
    }
}

/// Field selector for [`RegisterBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Register {
    Control,
    Status,
    Thrust,
    SensorTemp,
}

#[repr(C)]
#[derive(Debug, Default)]
pub struct RegisterBank {
    control: AtomicU32,
    status: AtomicU32,
    thrust: AtomicU32,
    sensor_temp: AtomicU32,
}

// Four contiguous 32-bit words, same as the hardware map.
const_assert_eq!(core::mem::size_of::<RegisterBank>(), 16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    pub control: u32,
    pub status: u32,
    pub thrust: u32,
    pub sensor_temp: u32,
}

impl RegisterBank {
    /// Zero-initialized bank, as at power-on.
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, register: Register) -> &AtomicU32 {
        match register {
            Register::Control => &self.control,
            Register::Status => &self.status,
            Register::Thrust => &self.thrust,
            Register::SensorTemp => &self.sensor_temp,
        }
    }

    pub fn read(&self, register: Register) -> u32 {
        self.cell(register).load(Ordering::SeqCst)
    }

    pub fn write(&self, register: Register, value: u32) {
        self.cell(register).store(value, Ordering::SeqCst);
    }

    /// Read-modify-write OR as a single indivisible access.
    pub fn set_bits(&self, register: Register, mask: u32) {
        self.cell(register).fetch_or(mask, Ordering::SeqCst);
    }

    /// Read-modify-write AND-NOT as a single indivisible access.
    pub fn clear_bits(&self, register: Register, mask: u32) {
        self.cell(register).fetch_and(!mask, Ordering::SeqCst);
    }

    /// Decoded view of the control register. Undefined bits are dropped.
    pub fn control(&self) -> ControlBits {
        ControlBits::from_bits_truncate(self.read(Register::Control))
    }

    pub fn is_enabled(&self) -> bool {
        self.control().contains(ControlBits::ENABLE)
    }

    pub fn is_faulted(&self) -> bool {
        self.control().contains(ControlBits::FAULT)
    }

    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            control: self.read(Register::Control),
            status: self.read(Register::Status),
            thrust: self.read(Register::Thrust),
            sensor_temp: self.read(Register::SensorTemp),
        }
    }
}
