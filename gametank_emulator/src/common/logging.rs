//! Logging setup shared by the library, the tests and hosts.
//!
//! Filtering is configured through the `GTANK_LOG` env var in `env_logger`
//! syntax, so individual targets such as `blitter` can be raised to trace
//! while the rest of the emulator stays quiet.
//!
//! Trace records are not printed as they arrive. They are kept in a small
//! ring buffer and replayed when a higher-level record comes in, so a
//! warning about a stray register write is preceded by the bus and blitter
//! activity that led up to it.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::Once;

use colored::Colorize;
use env_logger::Logger;
use log::Level;
use log::Log;
use log::Record;

static ONCE_INIT: Once = Once::new();

/// Trace records replayed as context ahead of a warning or error.
const TRACE_CONTEXT_LINES: usize = 20;

struct EmulatorLogger {
    logger: Logger,
    trace_context: Mutex<VecDeque<String>>,
}

impl EmulatorLogger {
    fn new(logger: Logger) -> Self {
        log::set_max_level(logger.filter());
        Self {
            logger,
            trace_context: Mutex::new(VecDeque::new()),
        }
    }

    fn flush_trace_context(&self, trace_context: &mut VecDeque<String>) {
        if trace_context.is_empty() {
            return;
        }
        if trace_context.len() == TRACE_CONTEXT_LINES {
            println!("{}", "...".dimmed());
        }
        for line in trace_context.drain(..) {
            println!("{line}");
        }
    }
}

fn format_record(record: &Record) -> String {
    let target = record.target();
    let args = record.args();
    match record.level() {
        Level::Error => format!(
            "{} [{target}] {}",
            "E".red().bold(),
            args.to_string().red()
        ),
        Level::Warn => format!(
            "{} [{target}] {}",
            "W".yellow().bold(),
            args.to_string().yellow()
        ),
        Level::Info => format!("{} {args}", "I".blue().bold()),
        Level::Debug => format!("{} [{target}] {args}", "D".blue()),
        Level::Trace => format!("{}", format!("[{target}] {args}").dimmed()),
    }
}

impl Log for EmulatorLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.logger.matches(record) {
            return;
        }
        let line = format_record(record);
        let mut trace_context = self.trace_context.lock().unwrap();
        if record.level() == Level::Trace {
            if trace_context.len() == TRACE_CONTEXT_LINES {
                trace_context.pop_front();
            }
            trace_context.push_back(line);
        } else {
            self.flush_trace_context(&mut trace_context);
            println!("{line}");
        }
    }

    fn flush(&self) {}
}

fn init_with_default_filter(default_filter: &str) {
    ONCE_INIT.call_once(|| {
        let filter_config = std::env::var("GTANK_LOG").unwrap_or(default_filter.to_string());
        let filter = env_logger::builder().parse_filters(&filter_config).build();
        log::set_boxed_logger(Box::new(EmulatorLogger::new(filter))).unwrap();
    });
}

pub fn init() {
    init_with_default_filter("error");
}

pub fn test_init(verbose: bool) {
    init_with_default_filter(if verbose { "info" } else { "warn" });
}
