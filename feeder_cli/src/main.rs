//! Binary entry point: config load, logging setup, command dispatch.

mod cli;
mod error_fmt;
mod rt;
mod run;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use feeder_traits::{Clock, MonotonicClock, MotorDrive, Tachometer};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    match real_main(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            if cli.json {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            std::process::exit(error_fmt::exit_code_for_error(&err));
        }
    }
}

fn real_main(cli: &Cli) -> eyre::Result<i32> {
    let raw = std::fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("failed to read config {}", cli.config.display()))?;
    let cfg = feeder_config::load_toml(&raw)
        .map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate().wrap_err("invalid configuration")?;

    init_logging(cli.json, &cli.log_level, &cfg.logging)?;

    match &cli.cmd {
        Commands::Run {
            reference,
            duration_ms,
            start_enabled,
            torch,
            rt,
            rt_prio,
        } => {
            rt::setup_rt_once(*rt, *rt_prio);

            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let shutdown = Arc::clone(&shutdown);
                ctrlc::set_handler(move || {
                    shutdown.store(true, Ordering::Relaxed);
                })
                .wrap_err("install ctrl-c handler")?;
            }

            let outcome = run::run_session(
                &cfg,
                run::RunOptions {
                    reference: *reference,
                    duration_ms: *duration_ms,
                    start_enabled: *start_enabled,
                    torch: *torch,
                },
                shutdown,
            )?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "comp_volt": outcome.comp_volt,
                        "speed_volt": outcome.speed_volt,
                        "ref_rpm": outcome.ref_rpm,
                        "steady": outcome.steady,
                        "steady_count": outcome.steady_count,
                        "torch_fired": outcome.torch_fired,
                    })
                );
            } else {
                println!(
                    "run complete: comp={:.2} speed={:.2} ref_rpm={:.2} steady={} steady_count={}{}",
                    outcome.comp_volt,
                    outcome.speed_volt,
                    outcome.ref_rpm,
                    outcome.steady,
                    outcome.steady_count,
                    if outcome.torch_fired { " torch=fired" } else { "" },
                );
            }
            Ok(0)
        }
        Commands::SelfCheck => self_check(&cfg, cli.json),
        Commands::Health => health(cli.json),
    }
}

/// Console layer (pretty or JSON) plus an optional non-blocking JSON file
/// layer per `[logging]`.
fn init_logging(json: bool, level: &str, logging: &feeder_config::Logging) -> eyre::Result<()> {
    let level = logging.level.as_deref().unwrap_or(level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err("invalid log level")?;

    let mut layers: Vec<Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>> = Vec::new();
    let console = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };
    layers.push(console);

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "feeder.log".into());
        let rotation = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::Rotation::DAILY,
            Some("hourly") => tracing_appender::rolling::Rotation::HOURLY,
            _ => tracing_appender::rolling::Rotation::NEVER,
        };
        let appender = tracing_appender::rolling::RollingFileAppender::new(rotation, dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).with(filter).init();
    Ok(())
}

/// Exercise the simulated plant end to end: command a duty, verify the
/// model responds and timestamps advance.
fn self_check(cfg: &feeder_config::Config, json: bool) -> eyre::Result<i32> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let (mut tach, mut drive) = feeder_hardware::sim_pair(cfg.motor.rated_rpm, 0.05, clock);

    drive
        .set_duty(0.2)
        .map_err(|e| eyre::eyre!("drive fault: {e}"))?;
    let first = tach
        .get_speed()
        .map_err(|e| eyre::eyre!("tachometer fault: {e}"))?;
    std::thread::sleep(Duration::from_millis(5));
    let second = tach
        .get_speed()
        .map_err(|e| eyre::eyre!("tachometer fault: {e}"))?;
    if second.timestamp_us <= first.timestamp_us {
        eyre::bail!("tachometer timestamps not monotonic");
    }

    if json {
        println!("{}", serde_json::json!({ "status": "ok" }));
    } else {
        println!("self-check ok");
    }
    Ok(0)
}

fn health(json: bool) -> eyre::Result<i32> {
    if json {
        println!(
            "{}",
            serde_json::json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") })
        );
    } else {
        println!("healthy {}", env!("CARGO_PKG_VERSION"));
    }
    Ok(0)
}
