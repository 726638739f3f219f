//! Logging setup for the `detect_features` example and other front ends.
//!
//! The `log` records of both crates go to stderr as
//! `[  0.123s DEBUG detector] message`, where the last field is the emitting
//! module without its crate prefix. With the `tracing` feature the stage spans
//! of the core crate can be reported through [`init_tracing`] instead.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Level used when a configuration names none, or an unknown one.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

struct FrameLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:7.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            short_target(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<FrameLogger> = OnceLock::new();

/// `chess_detector_core::maxima` -> `maxima`.
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Install the stderr logger. The first installed level sticks.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| FrameLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Level for a name such as `"debug"` or `"WARN"`.
pub fn level_from_str(name: &str) -> LevelFilter {
    name.parse().unwrap_or(DEFAULT_LEVEL)
}

/// Install the stderr logger at the level named in a detection config.
pub fn init_from_name(name: Option<&str>) -> Result<(), log::SetLoggerError> {
    init_with_level(name.map_or(DEFAULT_LEVEL, level_from_str))
}

/// Report `log` records and core stage spans through `tracing-subscriber`.
///
/// `RUST_LOG` overrides `default_directive`. Span close events carry the
/// stage timings; `json` switches to one JSON object per line.
#[cfg(feature = "tracing")]
pub fn init_tracing(default_directive: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.with_timer(fmt::time::Uptime::default()).finish().try_init()
    };
}
