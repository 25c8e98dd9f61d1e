//! Build profile resolution.
//!
//! Deployment mode and target architecture are selected once, before the loop
//! starts, from cargo features, environment variables, CLI flags and the
//! config file. The resolved [`BuildProfile`] is immutable and is handed to
//! every other component; nothing downstream looks at raw configuration.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use thiserror::Error;

/// Hard structural ceiling for any thrust limit.
pub const STRUCTURAL_LIMIT_N: u32 = 6000;
pub const FLIGHT_MAX_THRUST_N: u32 = 5000;
pub const GROUND_MAX_THRUST_N: u32 = 4000;
/// Every thrust limit is a whole multiple of this step.
pub const THRUST_LIMIT_STEP_N: u32 = 10;

const_assert!(FLIGHT_MAX_THRUST_N <= STRUCTURAL_LIMIT_N);
const_assert!(GROUND_MAX_THRUST_N <= STRUCTURAL_LIMIT_N);
const_assert!(FLIGHT_MAX_THRUST_N % THRUST_LIMIT_STEP_N == 0);
const_assert!(GROUND_MAX_THRUST_N % THRUST_LIMIT_STEP_N == 0);

pub const DEFAULT_MODE: Mode = Mode::Ground;
pub const DEFAULT_ARCHITECTURE: Architecture = Architecture::Riscv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Flight,
    Ground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Arm,
    Riscv,
}

impl Mode {
    pub const fn max_thrust_newtons(self) -> u32 {
        match self {
            Mode::Flight => FLIGHT_MAX_THRUST_N,
            Mode::Ground => GROUND_MAX_THRUST_N,
        }
    }

    /// Flight strips runtime checks and logs; ground keeps both.
    pub const fn diagnostics_enabled(self) -> bool {
        match self {
            Mode::Flight => false,
            Mode::Ground => true,
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Mode::Flight => write!(f, "flight"),
            Mode::Ground => write!(f, "ground"),
        }
    }
}

impl core::fmt::Display for Architecture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Architecture::Arm => write!(f, "arm"),
            Architecture::Riscv => write!(f, "riscv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("choose only one deployment mode: flight or ground")]
    ConflictingModes,

    #[error("choose only one target architecture: arm or riscv")]
    ConflictingArchitectures,

    #[error("max thrust {requested_n} N exceeds structural limit {limit_n} N")]
    StructuralLimitExceeded { requested_n: u32, limit_n: u32 },

    #[error("max thrust must be greater than zero")]
    ZeroThrustLimit,

    #[error("max thrust {requested_n} N is not a multiple of {step_n} N")]
    UnalignedThrustLimit { requested_n: u32, step_n: u32 },
}

/// Raw, unvalidated selection flags. Sources are merged with [`merge`](Self::merge).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileSelection {
    pub flight: bool,
    pub ground: bool,
    pub arm: bool,
    pub riscv: bool,
    /// Lowers the mode's limit; never raises it past the structural ceiling.
    pub max_thrust_override_n: Option<u32>,
}

impl ProfileSelection {
    /// Flags baked in through cargo features.
    pub fn from_features() -> Self {
        Self {
            flight: cfg!(feature = "flight"),
            ground: cfg!(feature = "ground"),
            arm: cfg!(feature = "cpu-arm"),
            riscv: cfg!(feature = "cpu-riscv"),
            max_thrust_override_n: None,
        }
    }

    /// `FLIGHT_BUILD`, `GROUND_BUILD`, `CPU_ARM`, `CPU_RISCV`. Any value other
    /// than empty, `0` or `false` selects.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let selected = |key: &str| {
            lookup(key).is_some_and(|value| {
                let value = value.trim();
                !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
            })
        };

        Self {
            flight: selected("FLIGHT_BUILD"),
            ground: selected("GROUND_BUILD"),
            arm: selected("CPU_ARM"),
            riscv: selected("CPU_RISCV"),
            max_thrust_override_n: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        match mode {
            Mode::Flight => self.flight = true,
            Mode::Ground => self.ground = true,
        }
        self
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        match architecture {
            Architecture::Arm => self.arm = true,
            Architecture::Riscv => self.riscv = true,
        }
        self
    }

    /// OR of both selections. A later override wins over an earlier one.
    pub fn merge(self, other: Self) -> Self {
        Self {
            flight: self.flight || other.flight,
            ground: self.ground || other.ground,
            arm: self.arm || other.arm,
            riscv: self.riscv || other.riscv,
            max_thrust_override_n: other.max_thrust_override_n.or(self.max_thrust_override_n),
        }
    }

    /// Fails on contradictory selections; missing ones take the documented
    /// default with a warning.
    pub fn resolve(&self) -> Result<BuildProfile, ProfileError> {
        let mode = match (self.flight, self.ground) {
            (true, true) => return Err(ProfileError::ConflictingModes),
            (true, false) => Mode::Flight,
            (false, true) => Mode::Ground,
            (false, false) => {
                tracing::warn!("No build type provided; defaulting to {}", DEFAULT_MODE);
                DEFAULT_MODE
            }
        };

        let architecture = match (self.arm, self.riscv) {
            (true, true) => return Err(ProfileError::ConflictingArchitectures),
            (true, false) => Architecture::Arm,
            (false, true) => Architecture::Riscv,
            (false, false) => {
                tracing::warn!("No CPU defined; defaulting to {}", DEFAULT_ARCHITECTURE);
                DEFAULT_ARCHITECTURE
            }
        };

        let max_thrust_newtons = match self.max_thrust_override_n {
            Some(0) => return Err(ProfileError::ZeroThrustLimit),
            Some(requested_n) if requested_n > STRUCTURAL_LIMIT_N => {
                return Err(ProfileError::StructuralLimitExceeded {
                    requested_n,
                    limit_n: STRUCTURAL_LIMIT_N,
                });
            }
            Some(requested_n) if requested_n % THRUST_LIMIT_STEP_N != 0 => {
                return Err(ProfileError::UnalignedThrustLimit {
                    requested_n,
                    step_n: THRUST_LIMIT_STEP_N,
                });
            }
            Some(requested_n) => requested_n.min(mode.max_thrust_newtons()),
            None => mode.max_thrust_newtons(),
        };

        Ok(BuildProfile {
            mode,
            architecture,
            max_thrust_newtons,
            asserts_enabled: mode.diagnostics_enabled(),
            logs_enabled: mode.diagnostics_enabled(),
        })
    }
}

/// Resolved safety and diagnostic posture for the life of the process.
///
/// Read-only outside the crate: a limit other than the mode default can only
/// come out of [`ProfileSelection::resolve`], which enforces the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildProfile {
    pub(crate) mode: Mode,
    pub(crate) architecture: Architecture,
    pub(crate) max_thrust_newtons: u32,
    pub(crate) asserts_enabled: bool,
    pub(crate) logs_enabled: bool,
}

impl BuildProfile {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn max_thrust_newtons(&self) -> u32 {
        self.max_thrust_newtons
    }

    pub fn asserts_enabled(&self) -> bool {
        self.asserts_enabled
    }

    pub fn logs_enabled(&self) -> bool {
        self.logs_enabled
    }

    pub fn flight(architecture: Architecture) -> Self {
        Self::for_mode(Mode::Flight, architecture)
    }

    pub fn ground(architecture: Architecture) -> Self {
        Self::for_mode(Mode::Ground, architecture)
    }

    fn for_mode(mode: Mode, architecture: Architecture) -> Self {
        Self {
            mode,
            architecture,
            max_thrust_newtons: mode.max_thrust_newtons(),
            asserts_enabled: mode.diagnostics_enabled(),
            logs_enabled: mode.diagnostics_enabled(),
        }
    }

    /// Requests above this are rejected instead of capped.
    pub fn rejection_threshold_newtons(&self) -> u32 {
        self.max_thrust_newtons.min(STRUCTURAL_LIMIT_N).saturating_mul(2)
    }
}

impl core::fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}/{} max_thrust={}N asserts={} logs={}",
            self.mode, self.architecture, self.max_thrust_newtons, self.asserts_enabled, self.logs_enabled
        )
    }
}
