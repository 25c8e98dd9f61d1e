use thrustgate::command::SafetyGate;
use thrustgate::diagnostics::{RecordingSink, SilentSink};
use thrustgate::profile::{Architecture, BuildProfile, Mode, ProfileSelection, STRUCTURAL_LIMIT_N};
use thrustgate::registers::{ControlBits, Register, RegisterBank};
use thrustgate::ErrorCode;

fn ground() -> BuildProfile {
    BuildProfile::ground(Architecture::Riscv)
}

fn flight() -> BuildProfile {
    BuildProfile::flight(Architecture::Arm)
}

fn lowered_ground(max_thrust_n: u32) -> BuildProfile {
    let mut selection = ProfileSelection::default()
        .with_mode(Mode::Ground)
        .with_architecture(Architecture::Riscv);
    selection.max_thrust_override_n = Some(max_thrust_n);
    selection.resolve().unwrap()
}

#[test]
fn test_requests_within_limit_are_written_exactly() {
    for profile in [ground(), flight()] {
        let gate = SafetyGate::new(profile, SilentSink);
        let bank = RegisterBank::new();

        for desired in [0, 1, 1500, 3000, profile.max_thrust_newtons() - 1, profile.max_thrust_newtons()] {
            assert_eq!(gate.command_thrust(desired, &bank, 0), ErrorCode::Ok);
            assert_eq!(bank.read(Register::Thrust), desired);
        }
    }
}

#[test]
fn test_requests_between_limit_and_twice_limit_are_capped() {
    for profile in [ground(), flight()] {
        let gate = SafetyGate::new(profile, SilentSink);
        let bank = RegisterBank::new();
        let limit = profile.max_thrust_newtons();

        for desired in [limit + 1, limit + limit / 2, 2 * limit] {
            bank.write(Register::Thrust, 0);
            assert_eq!(gate.command_thrust(desired, &bank, 0), ErrorCode::Ok);
            assert_eq!(bank.read(Register::Thrust), limit);
        }
    }
}

#[test]
fn test_requests_above_twice_limit_are_rejected_untouched() {
    for profile in [ground(), flight()] {
        let gate = SafetyGate::new(profile, SilentSink);
        let bank = RegisterBank::new();
        bank.write(Register::Thrust, 1234);

        for desired in [2 * profile.max_thrust_newtons() + 1, 20_000, u32::MAX] {
            assert_eq!(gate.command_thrust(desired, &bank, 0), ErrorCode::ThrustOutOfRange);
            assert_eq!(bank.read(Register::Thrust), 1234);
        }
    }
}

#[test]
fn test_flight_rejects_10001_newtons() {
    let gate = SafetyGate::new(flight(), SilentSink);
    let bank = RegisterBank::new();

    assert_eq!(gate.command_thrust(10_001, &bank, 0), ErrorCode::ThrustOutOfRange);
    assert_eq!(bank.read(Register::Thrust), 0);

    // 10000 is exactly twice the limit and still capped
    assert_eq!(gate.command_thrust(10_000, &bank, 0), ErrorCode::Ok);
    assert_eq!(bank.read(Register::Thrust), 5000);
}

#[test]
fn test_capping_emits_log_line() {
    let sink = RecordingSink::new();
    let gate = SafetyGate::new(ground(), &sink);
    let bank = RegisterBank::new();

    gate.command_thrust(4500, &bank, 7);

    let infos = sink.infos();
    assert!(infos.iter().any(|line| line.contains("4500") && line.contains("capping")));
    assert!(infos.iter().any(|line| line == "THRUST set to 4000 N"));
    assert_eq!(sink.traced_components(), vec!["command_thrust"]);
}

#[test]
fn test_in_limit_request_does_not_log_capping() {
    let sink = RecordingSink::new();
    let gate = SafetyGate::new(ground(), &sink);
    let bank = RegisterBank::new();

    gate.command_thrust(3000, &bank, 1);

    assert!(sink.infos().iter().all(|line| !line.contains("capping")));
}

#[test]
fn test_enable_disable_and_fault_bits() {
    let sink = RecordingSink::new();
    let gate = SafetyGate::new(ground(), &sink);
    let bank = RegisterBank::new();

    gate.enable_system(&bank);
    assert_eq!(bank.control(), ControlBits::ENABLE);

    gate.signal_fault(&bank);
    assert_eq!(bank.control(), ControlBits::ENABLE | ControlBits::FAULT);

    gate.disable_system(&bank);
    assert_eq!(bank.control(), ControlBits::FAULT);

    gate.clear_fault(&bank);
    assert!(bank.control().is_empty());

    assert_eq!(
        sink.infos(),
        vec!["System ENABLED", "FAULT signaled", "System DISABLED", "FAULT cleared"]
    );
}

#[test]
fn test_command_does_not_touch_control_bits() {
    let gate = SafetyGate::new(ground(), SilentSink);
    let bank = RegisterBank::new();
    gate.signal_fault(&bank);

    assert_eq!(gate.command_thrust(9000, &bank, 0), ErrorCode::ThrustOutOfRange);
    assert_eq!(gate.command_thrust(3000, &bank, 0), ErrorCode::Ok);
    assert_eq!(bank.control(), ControlBits::FAULT);
}

#[test]
fn test_lowered_limit_is_enforced() {
    let gate = SafetyGate::new(lowered_ground(2000), SilentSink);
    let bank = RegisterBank::new();

    assert_eq!(gate.command_thrust(3000, &bank, 0), ErrorCode::Ok);
    assert_eq!(bank.read(Register::Thrust), 2000);
    assert_eq!(gate.command_thrust(4001, &bank, 0), ErrorCode::ThrustOutOfRange);
}

#[test]
fn test_no_profile_writes_above_structural_limit() {
    let bank = RegisterBank::new();
    for profile in [ground(), flight(), lowered_ground(2000)] {
        let gate = SafetyGate::new(profile, SilentSink);
        assert!(gate.thrust_limit_newtons() <= STRUCTURAL_LIMIT_N);

        for desired in [STRUCTURAL_LIMIT_N, 9000, 2 * STRUCTURAL_LIMIT_N] {
            gate.command_thrust(desired, &bank, 0);
            assert!(bank.read(Register::Thrust) <= STRUCTURAL_LIMIT_N);
        }
    }
}

#[test]
fn test_flight_profile_emits_no_diagnostics() {
    let sink = RecordingSink::new();
    let gate = SafetyGate::new(flight(), &sink);
    let bank = RegisterBank::new();

    assert_eq!(gate.command_thrust(6000, &bank, 3), ErrorCode::Ok);
    gate.enable_system(&bank);
    gate.signal_fault(&bank);
    assert_eq!(gate.command_thrust(10_001, &bank, 4), ErrorCode::ThrustOutOfRange);

    assert_eq!(bank.read(Register::Thrust), 5000);
    assert!(sink.events().is_empty());
}
