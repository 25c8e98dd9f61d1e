//! # Thrustgate
//!
//! A safety-gated thruster control loop running against a simulated
//! memory-mapped register bank.
//!
//! ## Features
//!
//! - **Build profiles**: flight/ground mode and ARM/RISC-V target resolved once at startup
//! - **Safety gate**: thrust requests capped at the profile limit, rejected above twice that
//! - **Closed error taxonomy**: one table for codes and messages
//! - **Zero-cost diagnostics**: logging compiled out when the profile disables it
//! - **Fault simulation**: sensor drift, dropouts and hardware fault injection
//!
//! ## Quick Start
//!
//! ```rust
//! use thrustgate::{BuildProfile, ControlLoop, ErrorCode, RegisterBank, SilentSink, SimulatedSensor};
//! use thrustgate::profile::Architecture;
//!
//! let bank = RegisterBank::new();
//! let profile = BuildProfile::ground(Architecture::Riscv);
//! let mut control = ControlLoop::new(profile, SilentSink, SimulatedSensor::new(profile.architecture()));
//!
//! control.init_system(&bank).expect("init");
//! let result = control.run_tick(&bank).expect("running");
//! assert_eq!(result.code, ErrorCode::Ok);
//! control.shutdown(&bank);
//! ```
//!
//! ## Architecture
//!
//! - [`registers`] - Simulated register bank
//! - [`profile`] - Build profile resolution
//! - [`error_code`] - Result taxonomy
//! - [`command`] - Safety-gated command interface
//! - [`control_loop`] - Tick state machine
//! - [`sensor`] - Per-architecture sensor readers
//! - [`diagnostics`] - Injected logging/tracing sinks
//! - [`fault_injection`] - Simulated environment
//! - [`config`] - TOML configuration
//! - [`telemetry`] - Per-tick records

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::new_without_default)]

pub mod command;
pub mod config;
pub mod control_loop;
pub mod diagnostics;
pub mod error_code;
pub mod fault_injection;
pub mod profile;
pub mod registers;
pub mod sensor;
pub mod telemetry;

// Re-export main public types for convenience
pub use command::SafetyGate;
pub use control_loop::{ControlLoop, ControlLoopResult, LoopState};
pub use diagnostics::{DiagnosticSink, RecordingSink, SilentSink, TracingSink};
pub use error_code::{message_for, ErrorCode};
pub use profile::{BuildProfile, ProfileSelection};
pub use registers::{ControlBits, Register, RegisterBank};
pub use sensor::{SimulatedSensor, TemperatureSensor};
