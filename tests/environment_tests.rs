use thrustgate::control_loop::{ControlLoop, LoopState};
use thrustgate::diagnostics::SilentSink;
use thrustgate::fault_injection::{Environment, EnvironmentConfig};
use thrustgate::profile::{Architecture, BuildProfile};
use thrustgate::registers::{Register, RegisterBank};
use thrustgate::sensor::SimulatedSensor;
use thrustgate::telemetry::{TelemetryLog, TickRecord};
use thrustgate::ErrorCode;

fn setup() -> (RegisterBank, ControlLoop<SilentSink, SimulatedSensor>) {
    let bank = RegisterBank::new();
    let profile = BuildProfile::ground(Architecture::Riscv);
    let mut control = ControlLoop::new(profile, SilentSink, SimulatedSensor::new(profile.architecture()));
    control.init_system(&bank).unwrap();
    (bank, control)
}

#[test]
fn test_drift_is_applied_after_each_tick() {
    let (bank, _control) = setup();
    let sensor = SimulatedSensor::new(Architecture::Riscv);
    let mut environment = Environment::new();

    environment.after_tick(1, &bank, &sensor);
    environment.after_tick(2, &bank, &sensor);

    assert_eq!(bank.read(Register::SensorTemp), 52);
    assert_eq!(environment.stats().drift_applications, 2);
}

#[test]
fn test_cooling_drift_saturates_at_zero() {
    let bank = RegisterBank::new();
    let sensor = SimulatedSensor::new(Architecture::Riscv);
    bank.write(Register::SensorTemp, 4);
    let mut environment = Environment::new_with_config(EnvironmentConfig {
        drift_c_per_tick: -10,
        ..EnvironmentConfig::default()
    });

    environment.after_tick(1, &bank, &sensor);
    assert_eq!(bank.read(Register::SensorTemp), 0);
}

#[test]
fn test_cooling_crosses_policy_threshold() {
    let (bank, mut control) = setup();
    let mut environment = Environment::new_with_config(EnvironmentConfig {
        drift_c_per_tick: -7,
        ..EnvironmentConfig::default()
    });

    let mut thrusts = Vec::new();
    for _ in 0..3 {
        let result = control.run_tick(&bank).unwrap();
        thrusts.push(result.commanded_thrust_n.unwrap());
        environment.after_tick(result.tick, &bank, control.sensor());
    }

    // 42 -> 35 -> 28
    assert_eq!(thrusts, vec![1500, 1500, 3000]);
}

#[test]
fn test_scheduled_fault_faults_following_tick() {
    let (bank, mut control) = setup();
    let mut environment = Environment::new_with_config(EnvironmentConfig {
        fault_after_ticks: Some(2),
        ..EnvironmentConfig::default()
    });

    let mut codes = Vec::new();
    for _ in 0..3 {
        let result = control.run_tick(&bank).unwrap();
        codes.push(result.code);
        environment.after_tick(result.tick, &bank, control.sensor());
    }

    assert_eq!(codes, vec![ErrorCode::Ok, ErrorCode::Ok, ErrorCode::SystemFault]);
    assert_eq!(environment.stats().faults_injected, 1);
    assert_eq!(control.state(), LoopState::Faulted);
}

#[test]
fn test_sensor_dropout_on_scheduled_tick() {
    let (bank, mut control) = setup();
    let mut environment = Environment::new_with_config(EnvironmentConfig {
        sensor_dropout_at_tick: Some(2),
        ..EnvironmentConfig::default()
    });
    environment.before_first_tick(control.sensor());

    let first = control.run_tick(&bank).unwrap();
    environment.after_tick(first.tick, &bank, control.sensor());
    let second = control.run_tick(&bank).unwrap();

    assert_eq!(first.code, ErrorCode::Ok);
    assert_eq!(second.code, ErrorCode::SensorFailure);
    assert_eq!(environment.stats().dropouts_injected, 1);
}

#[test]
fn test_dropout_on_first_tick() {
    let (bank, mut control) = setup();
    let mut environment = Environment::new_with_config(EnvironmentConfig {
        sensor_dropout_at_tick: Some(1),
        ..EnvironmentConfig::default()
    });
    environment.before_first_tick(control.sensor());

    assert_eq!(control.run_tick(&bank).unwrap().code, ErrorCode::SensorFailure);
}

#[test]
fn test_telemetry_log_records_ticks() {
    let (bank, mut control) = setup();
    let mut log = TelemetryLog::new();

    let result = control.run_tick(&bank).unwrap();
    log.push(TickRecord::capture(result, control.state(), &bank));
    control.gate().signal_fault(&bank);
    let result = control.run_tick(&bank).unwrap();
    log.push(TickRecord::capture(result, control.state(), &bank));

    assert_eq!(log.total_recorded(), 2);
    assert_eq!(log.count_with(ErrorCode::SystemFault), 1);

    let latest = log.latest().unwrap();
    assert_eq!(latest.code_value, 30);
    assert_eq!(latest.message, "System Fault");
    assert_eq!(latest.state, LoopState::Faulted);
    assert_eq!(latest.registers.thrust, 1500);
    assert_eq!(latest.compact(), "tick=2 temp=42C thrust=1500N -> 30: System Fault");

    let json = log.to_json_lines().unwrap();
    assert_eq!(json.lines().count(), 2);
    let parsed: serde_json::Value = serde_json::from_str(json.lines().last().unwrap()).unwrap();
    assert_eq!(parsed["result"]["code"], "SystemFault");
    assert_eq!(parsed["message"], "System Fault");
}

#[test]
fn test_telemetry_log_is_bounded() {
    let (bank, mut control) = setup();
    let mut log = TelemetryLog::new();

    for _ in 0..40 {
        let result = control.run_tick(&bank).unwrap();
        log.push(TickRecord::capture(result, control.state(), &bank));
    }

    assert_eq!(log.records().len(), 32);
    assert_eq!(log.total_recorded(), 40);
    assert_eq!(log.records()[0].result.tick, 9);
}
