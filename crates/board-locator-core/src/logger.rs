//! Stderr logging for the locator binaries.
//!
//! Records from the locator crates are shown at the requested level and
//! tagged with the pipeline stage (module) that produced them, e.g.
//! `[   0.042s DEBUG search] evaluating 729 candidate triples`. Everything
//! else (image decoders and the like) is capped at `Warn` so that `debug`
//! output stays about the pipeline.

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

const LOCATOR_CRATES: [&str; 2] = ["board_locator", "board_locator_core"];

/// Crate part of a `log` target (`board_locator::search` -> `board_locator`).
fn crate_of(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

fn is_locator_target(target: &str) -> bool {
    LOCATOR_CRATES.contains(&crate_of(target))
}

/// Effective level for records from `target` when `level` was requested.
fn target_level(target: &str, level: LevelFilter) -> LevelFilter {
    if is_locator_target(target) {
        level
    } else {
        level.min(LevelFilter::Warn)
    }
}

/// Short tag printed with each record: the stage module for locator
/// records, the crate name otherwise.
fn stage_tag(target: &str) -> &str {
    if is_locator_target(target) {
        target.rsplit("::").next().unwrap_or(target)
    } else {
        crate_of(target)
    }
}

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= target_level(metadata.target(), self.level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            stage_tag(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stderr logger; locator records are shown up to `level`.
///
/// Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StageLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// `EnvFilter` directives equivalent to the stderr logger's filtering.
#[cfg(feature = "tracing")]
fn default_directives(level: LevelFilter) -> String {
    let own = level.as_str().to_ascii_lowercase();
    let foreign = level.min(LevelFilter::Warn).as_str().to_ascii_lowercase();
    let mut directives = foreign;
    for name in LOCATOR_CRATES {
        directives.push_str(&format!(",{name}={own}"));
    }
    directives
}

/// Install a `tracing` subscriber that reports per-stage span timings.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to the locator
/// crates as in [`init_with_level`]. `log` records are forwarded to the
/// subscriber.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
