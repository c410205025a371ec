mod cli;
mod error_fmt;
mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use macropad_config::Config;
use macropad_core::os_switch::OsMode;
use macropad_core::{Profile, atomic::write_atomic};
use macropad_traits::clock::test_clock::ManualClock;
use serde_json::json;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::{SessionReport, build_pad, run_session};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre already installed: {e}");
    }

    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
                tracing::debug!(error = ?err, "command failed");
            }
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    // Held until the command finishes so buffered file logs are flushed.
    let _file_guard = init_tracing(cli.json, cli.log_level.as_deref(), &cfg)?;
    cfg.validate()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match cli.cmd {
        Commands::Run {
            trace,
            scans,
            realtime,
            events,
        } => {
            let samples = macropad_config::load_raw_csv(&trace)
                .wrap_err_with(|| format!("load slider trace {}", trace.display()))?;
            let report = run_session(&cfg, samples, scans, realtime, &shutdown)?;
            print_session(&report, cli.json, events);
            Ok(())
        }
        Commands::Calibrate {
            samples,
            trim,
            write,
        } => calibrate(&samples, trim, write.as_deref(), cli.json),
        Commands::SelfCheck => self_check(&cfg, cli.calibration.as_deref(), cli.json),
        Commands::Keymap { profile } => {
            let profile = profile.map_or_else(|| Profile::from(cfg.profile), Profile::from);
            print_keymap(profile, cli.json);
            Ok(())
        }
    }
}

/// Load `path`, or `etc/macropad.toml` when present, or built-in defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let path: PathBuf = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG);
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let text = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    macropad_config::load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))
}

/// RUST_LOG wins over `--log-level`, which wins over `[logging].level`.
fn init_tracing(json: bool, level: Option<&str>, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = level.or(cfg.logging.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    // stdout carries results; logs go to stderr
    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match cfg.logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .with(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))?;
    Ok(guard)
}

fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

fn print_session(report: &SessionReport, json_out: bool, events: bool) {
    let s = &report.summary;
    if events {
        for (i, ev) in report.events.iter().enumerate() {
            if json_out {
                println!("{}", json!({ "event": i, "action": format!("{ev:?}") }));
            } else {
                println!("{i:>6}  {ev:?}");
            }
        }
    }
    if json_out {
        println!(
            "{}",
            json!({
                "timestamp": unix_timestamp(),
                "profile": report.profile.name(),
                "scans": s.scans,
                "steps_up": s.steps_up,
                "steps_down": s.steps_down,
                "final_level": s.final_level,
                "base_note": report.base_note,
                "host_events": report.events.len(),
                "duration_ms": u64::try_from(s.duration.as_millis()).unwrap_or(u64::MAX),
                "stop": s.stop.as_str(),
            })
        );
        return;
    }
    println!(
        "session complete ({}): {} scans, {} up, {} down",
        s.stop.as_str(),
        s.scans,
        s.steps_up,
        s.steps_down
    );
    if let Some(level) = s.final_level {
        println!("final level: {level}");
    }
    if let Some(note) = report.base_note {
        println!("base note: {note}");
    }
}

fn calibrate(samples: &Path, trim: f64, write: Option<&Path>, json_out: bool) -> Result<()> {
    let cal = macropad_config::load_calibration_csv(samples, trim)?;
    tracing::info!(
        raw_min = cal.raw_min,
        raw_max = cal.raw_max,
        samples = cal.samples,
        "calibrated"
    );
    if let Some(path) = write {
        let text = cal.to_toml()?;
        write_atomic(path, text.as_bytes())
            .wrap_err_with(|| format!("write calibration {}", path.display()))?;
    }
    if json_out {
        println!(
            "{}",
            json!({
                "raw_min": cal.raw_min,
                "raw_max": cal.raw_max,
                "samples": cal.samples,
                "written": write.map(|p| p.display().to_string()),
            })
        );
    } else {
        println!(
            "slider range: {}..={} ({} samples)",
            cal.raw_min, cal.raw_max, cal.samples
        );
        if let Some(path) = write {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn self_check(cfg: &Config, calibration: Option<&Path>, json_out: bool) -> Result<()> {
    if let Some(path) = calibration {
        let cal = macropad_config::load_calibration_csv(path, 0.01)?;
        tracing::info!(raw_min = cal.raw_min, raw_max = cal.raw_max, "calibration ok");
    }
    // Building runs every core validation and an immediate reset burst, if configured.
    let pad = build_pad(cfg, vec![0], Arc::new(ManualClock::new()))
        .wrap_err("building simulated pad")?;
    let mode = pad.slider_mode();
    if json_out {
        println!(
            "{}",
            json!({
                "ok": true,
                "profile": pad.profile().name(),
                "slider": format!("{mode:?}"),
            })
        );
    } else {
        println!(
            "ok: profile {}, slider {:?}, scan {} Hz",
            pad.profile().name(),
            mode,
            cfg.scan.rate_hz
        );
    }
    Ok(())
}

fn print_keymap(profile: Profile, json_out: bool) {
    let os_for = |layer: u8| {
        if layer >= OsMode::MacOs.base_layer() {
            OsMode::MacOs
        } else {
            OsMode::Linux
        }
    };
    if json_out {
        let layers: Vec<_> = profile
            .layers()
            .iter()
            .map(|(layer, keys)| {
                let keys: Vec<String> = keys.iter().map(|a| a.describe(os_for(*layer))).collect();
                json!({ "layer": layer, "keys": keys })
            })
            .collect();
        println!(
            "{}",
            json!({
                "profile": profile.name(),
                "slider": format!("{:?}", profile.slider_mode()),
                "switch": format!("{:?}", profile.switch_role()),
                "layers": layers,
            })
        );
        return;
    }
    println!(
        "profile {} (slider {:?}, switch {:?})",
        profile.name(),
        profile.slider_mode(),
        profile.switch_role()
    );
    for (layer, keys) in profile.layers() {
        let labels: Vec<String> = keys.iter().map(|a| a.describe(os_for(*layer))).collect();
        println!("  layer {layer}: {}", labels.join(" | "));
    }
}
