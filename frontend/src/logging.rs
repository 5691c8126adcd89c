//! Browser console logger for the `log` facade.
//!
//! The map fires `sourcedata` many times per second while tiles stream in, and the
//! tax readout logs at trace level on that path. Trace records are throttled so the
//! console stays readable.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::atomic::{AtomicUsize, Ordering};

const TRACE_WINDOW: usize = 100;
const MAX_TRACES_PER_WINDOW: usize = 5;

static LOGGER: ConsoleLogger = ConsoleLogger {
    trace_count: AtomicUsize::new(0),
};

#[derive(Debug, PartialEq, Eq)]
enum TraceDecision {
    Print,
    AnnounceSuppression,
    Drop,
}

/// Keeps the first few trace records out of every window of [`TRACE_WINDOW`].
fn trace_decision(count: usize) -> TraceDecision {
    match count % TRACE_WINDOW {
        position if position < MAX_TRACES_PER_WINDOW => TraceDecision::Print,
        MAX_TRACES_PER_WINDOW => TraceDecision::AnnounceSuppression,
        _ => TraceDecision::Drop,
    }
}

struct ConsoleLogger {
    trace_count: AtomicUsize,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => {
                zoon::eprintln!("[{}] {}", record.level(), record.args());
            }
            Level::Trace => {
                let count = self.trace_count.fetch_add(1, Ordering::Relaxed);
                match trace_decision(count) {
                    TraceDecision::Print => {
                        zoon::println!("[TRACE] {}", record.args());
                    }
                    TraceDecision::AnnounceSuppression => {
                        zoon::println!("[TRACE] rate limit reached, suppressing trace output...");
                    }
                    TraceDecision::Drop => {}
                }
            }
            level => {
                zoon::println!("[{level}] {}", record.args());
            }
        }
    }

    fn flush(&self) {}
}

pub fn init() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    match log::set_logger(&LOGGER) {
        Ok(()) => log::set_max_level(level),
        Err(error) => zoon::eprintln!("console logger not installed: {error}"),
    }
}
