//! One-tick sense/decide/act/check control loop.
//!
//! ```text
//! Initializing --init_system--> Running --SensorFailure|SystemFault--> Faulted
//!       |                        |  ^                                   |
//!       |                        |  +------- run_tick() == Ok ----------+
//!       +------------------------+--------- shutdown() ------------> Stopped
//! ```
//!
//! The loop never retries on its own and never swallows a non-OK code.

use crate::command::SafetyGate;
use crate::diagnostics::DiagnosticSink;
use crate::error_code::ErrorCode;
use crate::profile::{BuildProfile, THRUST_LIMIT_STEP_N};
use crate::registers::{Register, RegisterBank};
use crate::sensor::{raw_to_celsius, TemperatureSensor};
use heapless::Vec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Simulated start temperature written by `init_system`.
pub const BASELINE_SENSOR_TEMP: u32 = 42;

/// Placeholder two-branch policy; not derived from any plant model.
pub const COLD_THRESHOLD_C: i32 = 30;
pub const COLD_THRUST_N: u32 = 3000;
pub const WARM_THRUST_N: u32 = 1500;

const MAX_FAULT_HISTORY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    Initializing,
    Running,
    Faulted,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlLoopResult {
    pub tick: u64,
    pub code: ErrorCode,
    pub temperature_c: Option<i32>,
    pub commanded_thrust_n: Option<u32>,
}

impl ControlLoopResult {
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultRecord {
    pub tick: u64,
    pub code: ErrorCode,
    pub state_before: LoopState,
}

/// Critical precondition failures. These are fatal to the process, never
/// downgraded to an [`ErrorCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("system already initialized (state {0:?})")]
    AlreadyInitialized(LoopState),

    #[error("ENABLE bit did not latch")]
    EnableNotLatched,

    #[error("sensor seed readback {read} != {expected}")]
    SensorSeedMismatch { expected: u32, read: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoopError {
    #[error("control loop is not running (state {0:?})")]
    NotRunning(LoopState),
}

pub fn thrust_policy(temperature_c: i32) -> u32 {
    if temperature_c < COLD_THRESHOLD_C {
        COLD_THRUST_N
    } else {
        WARM_THRUST_N
    }
}

pub struct ControlLoop<S: DiagnosticSink, T: TemperatureSensor> {
    gate: SafetyGate<S>,
    sensor: T,
    state: LoopState,
    tick_count: u64,
    last_result: Option<ControlLoopResult>,
    fault_history: Vec<FaultRecord, MAX_FAULT_HISTORY>,
}

impl<S: DiagnosticSink, T: TemperatureSensor> ControlLoop<S, T> {
    pub fn new(profile: BuildProfile, sink: S, sensor: T) -> Self {
        Self {
            gate: SafetyGate::new(profile, sink),
            sensor,
            state: LoopState::Initializing,
            tick_count: 0,
            last_result: None,
            fault_history: Vec::new(),
        }
    }

    /// Enable the system and seed the sensor register.
    ///
    /// Both writes are read back. When asserts are enabled the profile limit
    /// is also checked to be a multiple of 10.
    pub fn init_system(&mut self, bank: &RegisterBank) -> Result<(), InitError> {
        self.gate.trace("init_system", self.tick_count);

        if self.state != LoopState::Initializing {
            return Err(InitError::AlreadyInitialized(self.state));
        }

        self.gate.enable_system(bank);
        if !bank.is_enabled() {
            return Err(InitError::EnableNotLatched);
        }

        bank.write(Register::SensorTemp, BASELINE_SENSOR_TEMP);
        let read = bank.read(Register::SensorTemp);
        if read != BASELINE_SENSOR_TEMP {
            return Err(InitError::SensorSeedMismatch {
                expected: BASELINE_SENSOR_TEMP,
                read,
            });
        }

        // Backstop; resolve() already rejects unaligned limits.
        let profile = self.gate.profile();
        if profile.asserts_enabled() {
            assert!(
                profile.max_thrust_newtons() % THRUST_LIMIT_STEP_N == 0,
                "max thrust {} N is not a multiple of {THRUST_LIMIT_STEP_N}",
                profile.max_thrust_newtons()
            );
        }

        self.state = LoopState::Running;
        Ok(())
    }

    /// Read and convert the temperature sensor.
    pub fn poll_temperature(&self, bank: &RegisterBank) -> Result<i32, ErrorCode> {
        self.gate.trace("poll_temperature", self.tick_count);

        let raw = self.sensor.read_raw(bank).map_err(|fault| {
            self.gate.info(format_args!("{fault}"));
            ErrorCode::SensorFailure
        })?;

        let temperature_c = raw_to_celsius(raw);
        self.gate.info(format_args!("Temp={temperature_c} C"));
        Ok(temperature_c)
    }

    /// Run one tick. Allowed from `Running`, and from `Faulted` as a
    /// caller-initiated retry.
    pub fn run_tick(&mut self, bank: &RegisterBank) -> Result<ControlLoopResult, LoopError> {
        if !matches!(self.state, LoopState::Running | LoopState::Faulted) {
            return Err(LoopError::NotRunning(self.state));
        }

        self.tick_count = self.tick_count.wrapping_add(1);
        let tick = self.tick_count;
        self.gate.trace("run_tick", tick);

        let result = self.execute_tick(bank, tick);
        self.record(result);
        Ok(result)
    }

    fn execute_tick(&self, bank: &RegisterBank, tick: u64) -> ControlLoopResult {
        let mut result = ControlLoopResult {
            tick,
            code: ErrorCode::Ok,
            temperature_c: None,
            commanded_thrust_n: None,
        };

        let temperature_c = match self.poll_temperature(bank) {
            Ok(temperature_c) => temperature_c,
            Err(code) => {
                result.code = code;
                return result;
            }
        };
        result.temperature_c = Some(temperature_c);

        let desired = thrust_policy(temperature_c);
        let code = self.gate.command_thrust(desired, bank, tick);
        if !code.is_ok() {
            result.code = code;
            return result;
        }
        result.commanded_thrust_n = Some(bank.read(Register::Thrust));

        // Fault bit outranks an otherwise clean tick
        if bank.is_faulted() {
            result.code = ErrorCode::SystemFault;
        }
        result
    }

    fn record(&mut self, result: ControlLoopResult) {
        let state_before = self.state;
        match result.code {
            ErrorCode::Ok => self.state = LoopState::Running,
            ErrorCode::SensorFailure | ErrorCode::SystemFault => self.state = LoopState::Faulted,
            ErrorCode::ThrustOutOfRange => {}
        }

        if !result.is_ok() {
            if self.fault_history.is_full() {
                self.fault_history.remove(0);
            }
            let record = FaultRecord {
                tick: result.tick,
                code: result.code,
                state_before,
            };
            if let Err(dropped) = self.fault_history.push(record) {
                tracing::warn!("Fault history full; dropped record for tick {}", dropped.tick);
            }
        }

        self.last_result = Some(result);
    }

    /// Clear ENABLE and stop. Idempotent.
    pub fn shutdown(&mut self, bank: &RegisterBank) {
        self.gate.disable_system(bank);
        self.state = LoopState::Stopped;
    }

    pub fn gate(&self) -> &SafetyGate<S> {
        &self.gate
    }

    pub fn sensor(&self) -> &T {
        &self.sensor
    }

    pub fn profile(&self) -> &BuildProfile {
        self.gate.profile()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn last_result(&self) -> Option<&ControlLoopResult> {
        self.last_result.as_ref()
    }

    pub fn fault_history(&self) -> &[FaultRecord] {
        &self.fault_history
    }
}
