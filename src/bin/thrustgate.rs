use clap::{App, Arg, ArgMatches, SubCommand};
use colored::*;
use std::fmt::Display;
use std::path::Path;
use std::process;
use thrustgate::config::{ConfigError, OutputFormat, ThrustgateConfig};
use thrustgate::control_loop::ControlLoop;
use thrustgate::diagnostics::{DiagnosticSink, SilentSink, TracingSink};
use thrustgate::error_code::ErrorCode;
use thrustgate::fault_injection::Environment;
use thrustgate::profile::{Architecture, BuildProfile, Mode, ProfileSelection};
use thrustgate::registers::RegisterBank;
use thrustgate::sensor::SimulatedSensor;
use thrustgate::telemetry::{TelemetryLog, TickRecord};
use tracing::{error, info, Level};

const EXIT_CRITICAL: i32 = 1;
const EXIT_CONFIG: i32 = 2;

fn main() {
    let matches = App::new("thrustgate")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Space Systems Engineering Team")
        .about("🚀 Safety-gated thruster control loop on a simulated register bank")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file")
                .takes_value(true)
                .global(true),
        )
        .arg(Arg::with_name("flight").long("flight").help("Select flight mode (5000 N, no asserts, no logs)").global(true))
        .arg(Arg::with_name("ground").long("ground").help("Select ground mode (4000 N, asserts and logs)").global(true))
        .arg(Arg::with_name("arm").long("arm").help("Target ARM").global(true))
        .arg(Arg::with_name("riscv").long("riscv").help("Target RISC-V").global(true))
        .arg(
            Arg::with_name("ticks")
                .short("n")
                .long("ticks")
                .value_name("N")
                .help("Number of drift ticks before the fault exercise")
                .takes_value(true)
                .global(true)
                .validator(|v| match v.parse::<u32>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Ticks must be a non-negative integer".into()),
                }),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .global(true),
        )
        .arg(
            Arg::with_name("no-fault")
                .long("no-fault")
                .help("Skip the signal-fault exercise after the drift ticks")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable trace-level output")
                .global(true),
        )
        .subcommand(SubCommand::with_name("run").about("Run the control loop demo sequence (default)"))
        .subcommand(SubCommand::with_name("profile").about("Resolve and print the build profile"))
        .subcommand(SubCommand::with_name("codes").about("Print the error code table"))
        .get_matches();

    let level = if matches.is_present("verbose") { Level::TRACE } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    let config = or_exit(EXIT_CONFIG, "load config", load_config(&matches));
    let profile = or_exit(EXIT_CONFIG, "resolve profile", profile_selection(&matches, &config).resolve());

    info!(
        "Build: thrustgate v{} | host {} | profile {}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        profile
    );

    match matches.subcommand() {
        ("profile", _) => print_profile(&profile),
        ("codes", _) => print_codes(),
        _ => {
            let options = DemoOptions::from_matches(&matches, &config);
            let log = if profile.logs_enabled() {
                run_demo(profile, TracingSink, &config, &options)
            } else {
                run_demo(profile, SilentSink, &config, &options)
            };
            print_log(&log, options.format);
        }
    }
}

/// Call-and-abort for critical steps: log the failing step and exit.
fn or_exit<T, E: Display>(status: i32, step: &str, result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!("{} failed: {}", step, e);
            eprintln!("{} {} failed: {}", "❌".red(), step.bright_white(), e.to_string().bright_red());
            process::exit(status);
        }
    }
}

fn load_config(matches: &ArgMatches) -> Result<ThrustgateConfig, ConfigError> {
    match matches.value_of("config") {
        Some(path) => ThrustgateConfig::load(Path::new(path)),
        None => Ok(ThrustgateConfig::default()),
    }
}

fn profile_selection(matches: &ArgMatches, config: &ThrustgateConfig) -> ProfileSelection {
    let mut cli = ProfileSelection::default();
    if matches.is_present("flight") {
        cli = cli.with_mode(Mode::Flight);
    }
    if matches.is_present("ground") {
        cli = cli.with_mode(Mode::Ground);
    }
    if matches.is_present("arm") {
        cli = cli.with_architecture(Architecture::Arm);
    }
    if matches.is_present("riscv") {
        cli = cli.with_architecture(Architecture::Riscv);
    }

    ProfileSelection::from_features()
        .merge(ProfileSelection::from_env())
        .merge(config.profile.selection())
        .merge(cli)
}

struct DemoOptions {
    ticks: u32,
    format: OutputFormat,
    exercise_fault: bool,
}

impl DemoOptions {
    fn from_matches(matches: &ArgMatches, config: &ThrustgateConfig) -> Self {
        let ticks = matches
            .value_of("ticks")
            .and_then(|t| t.parse::<u32>().ok())
            .unwrap_or(config.demo.ticks);
        let format = matches
            .value_of("format")
            .and_then(|f| f.parse::<OutputFormat>().ok())
            .unwrap_or(config.demo.format);
        Self {
            ticks,
            format,
            exercise_fault: config.demo.exercise_fault && !matches.is_present("no-fault"),
        }
    }
}

/// Init, drift ticks until the first non-OK result, then signal a fault and
/// run one more tick, then shut down.
fn run_demo<S: DiagnosticSink>(
    profile: BuildProfile,
    sink: S,
    config: &ThrustgateConfig,
    options: &DemoOptions,
) -> TelemetryLog {
    let bank = RegisterBank::new();
    let mut control = ControlLoop::new(profile, sink, SimulatedSensor::new(profile.architecture()));
    let mut environment = Environment::new_with_config(config.environment.clone());
    let mut log = TelemetryLog::new();

    or_exit(EXIT_CRITICAL, "init_system", control.init_system(&bank));
    environment.before_first_tick(control.sensor());

    for _ in 0..options.ticks {
        let result = or_exit(EXIT_CRITICAL, "run_tick", control.run_tick(&bank));
        log.push(TickRecord::capture(result, control.state(), &bank));
        if !result.is_ok() {
            report(result.code);
            break;
        }
        environment.after_tick(result.tick, &bank, control.sensor());
    }

    if options.exercise_fault {
        control.gate().signal_fault(&bank);
        let result = or_exit(EXIT_CRITICAL, "run_tick", control.run_tick(&bank));
        log.push(TickRecord::capture(result, control.state(), &bank));
        if !result.is_ok() {
            report(result.code);
        }
    }

    control.shutdown(&bank);
    info!(
        "Loop stopped after {} ticks ({} faults recorded)",
        control.tick_count(),
        control.fault_history().len()
    );
    log
}

fn report(code: ErrorCode) {
    eprintln!("{} {}", format!("ERROR {}:", code.value()).red(), code.message().bright_red());
}

fn print_log(log: &TelemetryLog, format: OutputFormat) {
    match format {
        OutputFormat::Json => match log.to_json_lines() {
            Ok(lines) => print!("{}", lines),
            Err(e) => error!("Failed to serialize telemetry: {}", e),
        },
        OutputFormat::Compact => {
            for record in log.records() {
                println!("{}", record.compact());
            }
        }
        OutputFormat::Table => {
            println!(
                "{}",
                format!("{:>5} {:>8} {:>10} {:>10} {}", "TICK", "TEMP C", "THRUST N", "STATE", "RESULT")
                    .bright_blue()
                    .bold()
            );
            for record in log.records() {
                let temp = record.result.temperature_c.map_or_else(|| "-".to_string(), |t| t.to_string());
                let thrust = record.result.commanded_thrust_n.map_or_else(|| "-".to_string(), |n| n.to_string());
                let result = record.result.code.to_string();
                let result = if record.result.is_ok() { result.green() } else { result.red() };
                println!(
                    "{:>5} {:>8} {:>10} {:>10} {}",
                    record.result.tick,
                    temp,
                    thrust,
                    format!("{:?}", record.state),
                    result
                );
            }
        }
    }
}

fn print_profile(profile: &BuildProfile) {
    println!("{}", "Build profile".bright_blue().bold());
    println!("  {:<22} {}", "mode:", profile.mode().to_string().bright_cyan());
    println!("  {:<22} {}", "architecture:", profile.architecture().to_string().bright_cyan());
    println!("  {:<22} {} N", "max thrust:", profile.max_thrust_newtons());
    println!("  {:<22} {} N", "rejection threshold:", profile.rejection_threshold_newtons());
    println!("  {:<22} {}", "asserts:", profile.asserts_enabled());
    println!("  {:<22} {}", "logs:", profile.logs_enabled());
}

fn print_codes() {
    println!("{}", format!("{:>5}  {:<18} {}", "CODE", "NAME", "MESSAGE").bright_blue().bold());
    for code in ErrorCode::ALL {
        println!("{:>5}  {:<18} {}", code.value(), format!("{:?}", code), code.message());
    }
}
