//! Diagnostic logging on stderr.
//!
//! `OATLINK_LOG` takes an `EnvFilter` directive (e.g. `oatlink_linker=trace`).
//! Each `-v` raises the default level instead: warn, debug, trace.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "OATLINK_LOG";

pub fn init(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn filter(verbosity: u8) -> EnvFilter {
    if verbosity == 0
        && let Ok(filter) = EnvFilter::try_from_env(LOG_ENV)
    {
        return filter;
    }
    EnvFilter::new(default_level(verbosity))
}

pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod logging_tests;
