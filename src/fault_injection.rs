//! Simulated environment around the loop: sensor drift between ticks, a
//! hardware fault raised on the control register, and sensor dropouts.

use crate::registers::{ControlBits, Register, RegisterBank};
use crate::sensor::SimulatedSensor;
use serde::{Deserialize, Serialize};

const DEFAULT_DRIFT_C_PER_TICK: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Added to the sensor register after every tick. Negative values cool.
    pub drift_c_per_tick: i32,
    /// Raise FAULT once this many ticks have completed.
    pub fault_after_ticks: Option<u64>,
    /// Make the read on this tick number fail.
    pub sensor_dropout_at_tick: Option<u64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            drift_c_per_tick: DEFAULT_DRIFT_C_PER_TICK,
            fault_after_ticks: None,
            sensor_dropout_at_tick: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionStats {
    pub ticks_observed: u64,
    pub drift_applications: u32,
    pub faults_injected: u32,
    pub dropouts_injected: u32,
}

#[derive(Debug)]
pub struct Environment {
    config: EnvironmentConfig,
    stats: InjectionStats,
}

impl Environment {
    pub fn new() -> Self {
        Self::new_with_config(EnvironmentConfig::default())
    }

    pub fn new_with_config(config: EnvironmentConfig) -> Self {
        Self {
            config,
            stats: InjectionStats::default(),
        }
    }

    /// Apply environment effects after `tick` has completed.
    pub fn after_tick(&mut self, tick: u64, bank: &RegisterBank, sensor: &SimulatedSensor) {
        self.stats.ticks_observed = self.stats.ticks_observed.max(tick);

        if self.config.drift_c_per_tick != 0 {
            self.apply_drift(bank);
        }

        if self.config.fault_after_ticks == Some(tick) {
            self.inject_fault(bank);
        }

        if self.config.sensor_dropout_at_tick == Some(tick + 1) {
            sensor.inject_read_failures(1);
            self.stats.dropouts_injected += 1;
        }
    }

    /// Dropouts scheduled for the very first tick must be armed before it.
    pub fn before_first_tick(&mut self, sensor: &SimulatedSensor) {
        if self.config.sensor_dropout_at_tick == Some(1) {
            sensor.inject_read_failures(1);
            self.stats.dropouts_injected += 1;
        }
    }

    fn apply_drift(&mut self, bank: &RegisterBank) {
        // Sensor register is unsigned; cooling saturates at zero.
        let current = bank.read(Register::SensorTemp);
        let drift = self.config.drift_c_per_tick;
        let next = if drift >= 0 {
            current.saturating_add(drift.unsigned_abs())
        } else {
            current.saturating_sub(drift.unsigned_abs())
        };
        bank.write(Register::SensorTemp, next);
        self.stats.drift_applications += 1;
    }

    /// Raise the hardware FAULT bit directly, bypassing the command gate.
    pub fn inject_fault(&mut self, bank: &RegisterBank) {
        bank.set_bits(Register::Control, ControlBits::FAULT.bits());
        self.stats.faults_injected += 1;
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn stats(&self) -> &InjectionStats {
        &self.stats
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
