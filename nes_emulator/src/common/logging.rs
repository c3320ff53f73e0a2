//! Utilities for configuring logging
//!
//! The filter is configured through the `NES_LOG` environment variable using the env_logger
//! syntax, e.g. `NES_LOG=warn,cpu_state=trace`.
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::Once;

use colored::*;
use env_logger::Logger;
use log::Level;
use log::Log;
use log::Record;

static ONCE_INIT: Once = Once::new();

const TRACE_CONTEXT_LINES: usize = 32;

const LOG_FILTER_ENV: &str = "NES_LOG";

/// Logger using env_logger filters with a compact, colored format.
///
/// Trace records are not printed right away. The last `TRACE_CONTEXT_LINES` of them are kept
/// in a ring buffer and printed as context before the next record of a higher level, so a
/// warning about e.g. an unhandled register access shows the CPU instructions leading up to it.
struct NesLogger {
    trace_logs: Mutex<VecDeque<String>>,
    logger: Logger,
}

impl NesLogger {
    fn new(logger: Logger) -> Self {
        log::set_max_level(logger.filter());
        Self {
            trace_logs: Mutex::new(VecDeque::new()),
            logger,
        }
    }

    fn format_record(&self, record: &Record) -> String {
        match record.level() {
            Level::Error => {
                format!("{} {}", "E".red().bold(), record.args().to_string().red())
            }
            Level::Warn => format!(
                "{} {}",
                "W".yellow().bold(),
                record.args().to_string().yellow()
            ),
            Level::Info => format!(
                "{} {}",
                "I".blue().bold(),
                record.args().to_string().normal()
            ),
            Level::Debug => format!("{} {}", "D".blue(), record.args().to_string().normal()),
            Level::Trace => format!(
                "{} {}",
                record.target().dimmed(),
                record.args().to_string().dimmed()
            ),
        }
    }
}

impl Log for NesLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.logger.matches(record) {
            return;
        }
        let record_str = self.format_record(record);
        let Ok(mut trace_logs) = self.trace_logs.lock() else {
            return;
        };
        if record.level() == Level::Trace {
            trace_logs.push_front(record_str);
            trace_logs.truncate(TRACE_CONTEXT_LINES);
        } else {
            if trace_logs.len() == TRACE_CONTEXT_LINES {
                println!("{}", "...".dimmed());
            }
            for line in trace_logs.drain(0..).rev() {
                println!("{}", line);
            }
            println!("{}", record_str);
        }
    }

    fn flush(&self) {}
}

fn install(default_filter: &str) {
    let filter_config = std::env::var(LOG_FILTER_ENV).unwrap_or(default_filter.to_string());
    let filter = env_logger::builder().parse_filters(&filter_config).build();
    // Another logger may already be installed by the embedding application.
    let _ = log::set_boxed_logger(Box::new(NesLogger::new(filter)));
}

/// Installs the logger. Safe to call multiple times.
pub fn init() {
    ONCE_INIT.call_once(|| install("error"));
}

/// Installs the logger for tests. `verbose` enables the per-instruction CPU trace.
pub fn test_init(verbose: bool) {
    ONCE_INIT.call_once(|| {
        install(if verbose {
            "info,cpu_state=trace"
        } else {
            "warn"
        })
    });
}
