//! Temperature sensor access, one reader per target architecture.

use crate::profile::Architecture;
use crate::registers::{Register, RegisterBank};
use core::cell::Cell;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorFault {
    #[error("{architecture} temperature read failed")]
    ReadFailed { architecture: Architecture },
}

pub trait TemperatureSensor {
    fn architecture(&self) -> Architecture;

    /// Raw register value. Failing reads leave the bank untouched.
    fn read_raw(&self, bank: &RegisterBank) -> Result<u32, SensorFault>;
}

/// Reads `SENS_TEMP` from the simulated bank. Read failures can be armed to
/// exercise the sensor-failure path.
#[derive(Debug)]
pub struct SimulatedSensor {
    architecture: Architecture,
    pending_failures: Cell<u32>,
}

impl SimulatedSensor {
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            pending_failures: Cell::new(0),
        }
    }

    /// The next `count` reads fail.
    pub fn inject_read_failures(&self, count: u32) {
        self.pending_failures
            .set(self.pending_failures.get().saturating_add(count));
    }

    pub fn pending_failures(&self) -> u32 {
        self.pending_failures.get()
    }

    pub fn clear_failures(&self) {
        self.pending_failures.set(0);
    }

    fn take_failure(&self) -> bool {
        let pending = self.pending_failures.get();
        if pending == 0 {
            return false;
        }
        self.pending_failures.set(pending - 1);
        true
    }
}

impl TemperatureSensor for SimulatedSensor {
    fn architecture(&self) -> Architecture {
        self.architecture
    }

    fn read_raw(&self, bank: &RegisterBank) -> Result<u32, SensorFault> {
        if self.take_failure() {
            return Err(SensorFault::ReadFailed {
                architecture: self.architecture,
            });
        }

        // Both ports map the same register in simulation; on hardware the
        // ARM and RISC-V paths differ only in bus access.
        let raw = match self.architecture {
            Architecture::Arm => bank.read(Register::SensorTemp),
            Architecture::Riscv => bank.read(Register::SensorTemp),
        };
        Ok(raw)
    }
}

/// Linearization from raw counts to Celsius. The simulated sensor already
/// reports Celsius.
pub fn raw_to_celsius(raw: u32) -> i32 {
    i32::try_from(raw).unwrap_or(i32::MAX)
}
