//! Safety-gated command interface.
//!
//! All writes that change actuation or control bits go through [`SafetyGate`].
//! Thrust requests follow a two-tier policy: anything above twice the profile
//! limit is rejected without touching the bank, anything between the limit and
//! that threshold is capped to the limit. No write ever exceeds
//! [`STRUCTURAL_LIMIT_N`].

use crate::diagnostics::DiagnosticSink;
use crate::error_code::ErrorCode;
use crate::profile::{BuildProfile, STRUCTURAL_LIMIT_N};
use crate::registers::{ControlBits, Register, RegisterBank};
use core::fmt;

pub struct SafetyGate<S: DiagnosticSink> {
    profile: BuildProfile,
    sink: S,
}

impl<S: DiagnosticSink> SafetyGate<S> {
    pub fn new(profile: BuildProfile, sink: S) -> Self {
        Self { profile, sink }
    }

    pub fn profile(&self) -> &BuildProfile {
        &self.profile
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Effective limit: the profile's, never above the structural ceiling.
    pub fn thrust_limit_newtons(&self) -> u32 {
        self.profile.max_thrust_newtons().min(STRUCTURAL_LIMIT_N)
    }

    // Both channels are dead when the profile strips logs.
    #[inline]
    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        if self.profile.logs_enabled() {
            self.sink.info(args);
        }
    }

    #[inline]
    pub(crate) fn trace(&self, component: &'static str, tick: u64) {
        if self.profile.logs_enabled() {
            self.sink.trace(component, tick);
        }
    }

    /// Validate, cap and write a thrust request.
    ///
    /// Returns [`ErrorCode::ThrustOutOfRange`] with the register unchanged
    /// when `desired_newtons` exceeds twice the limit. Otherwise the written
    /// value is `min(desired_newtons, limit)`.
    pub fn command_thrust(&self, desired_newtons: u32, bank: &RegisterBank, tick: u64) -> ErrorCode {
        self.trace("command_thrust", tick);

        let limit = self.thrust_limit_newtons();
        if desired_newtons > limit.saturating_mul(2) {
            self.info(format_args!(
                "Thrust request {desired_newtons} N rejected (limit {limit} N)"
            ));
            return ErrorCode::ThrustOutOfRange;
        }

        let mut newtons = desired_newtons;
        if newtons > limit {
            self.info(format_args!(
                "Thrust request {newtons} exceeds limit {limit} - capping"
            ));
            newtons = limit;
        }

        bank.write(Register::Thrust, newtons);

        if self.profile.asserts_enabled() {
            let written = bank.read(Register::Thrust);
            assert!(
                written <= limit,
                "thrust register {written} N above limit {limit} N"
            );
        }

        self.info(format_args!("THRUST set to {newtons} N"));
        ErrorCode::Ok
    }

    pub fn enable_system(&self, bank: &RegisterBank) {
        bank.set_bits(Register::Control, ControlBits::ENABLE.bits());
        self.info(format_args!("System ENABLED"));
    }

    pub fn disable_system(&self, bank: &RegisterBank) {
        bank.clear_bits(Register::Control, ControlBits::ENABLE.bits());
        self.info(format_args!("System DISABLED"));
    }

    pub fn signal_fault(&self, bank: &RegisterBank) {
        bank.set_bits(Register::Control, ControlBits::FAULT.bits());
        self.info(format_args!("FAULT signaled"));
    }

    /// Out-of-band remediation after a hardware fault. The loop never calls
    /// this on its own.
    pub fn clear_fault(&self, bank: &RegisterBank) {
        bank.clear_bits(Register::Control, ControlBits::FAULT.bits());
        self.info(format_args!("FAULT cleared"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SilentSink;
    use crate::profile::{Architecture, Mode};

    fn oversized_profile(max_thrust_newtons: u32) -> BuildProfile {
        BuildProfile {
            mode: Mode::Ground,
            architecture: Architecture::Riscv,
            max_thrust_newtons,
            asserts_enabled: true,
            logs_enabled: false,
        }
    }

    #[test]
    fn test_writes_never_exceed_structural_limit() {
        let gate = SafetyGate::new(oversized_profile(9000), SilentSink);
        let bank = RegisterBank::new();

        assert_eq!(gate.thrust_limit_newtons(), STRUCTURAL_LIMIT_N);
        assert_eq!(gate.command_thrust(9000, &bank, 0), ErrorCode::Ok);
        assert_eq!(bank.read(Register::Thrust), STRUCTURAL_LIMIT_N);
    }

    #[test]
    fn test_rejection_threshold_follows_structural_limit() {
        let gate = SafetyGate::new(oversized_profile(9000), SilentSink);
        let bank = RegisterBank::new();

        assert_eq!(gate.command_thrust(12_001, &bank, 0), ErrorCode::ThrustOutOfRange);
        assert_eq!(bank.read(Register::Thrust), 0);
    }
}
