//! Logger construction for the binary.
//!
//! The library only emits through the `log` facade. The binary builds one
//! `env_logger` instance from a [`LogConfig`] and installs it once.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Local;
use env_logger::{Builder, Logger, Target, WriteStyle};
use log::LevelFilter;

/// Environment variable that overrides the computed filter.
pub const LOG_ENV: &str = "CARDSHEET_LOG";

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Debug level, timestamped lines, mirrored to a log file.
    pub verbose: bool,
    /// Log file used in verbose mode; [`default_log_path`] when unset.
    pub log_path: Option<PathBuf>,
}

impl LogConfig {
    pub fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

/// `cardsheet_YYYYMMDD_HHMMSS.log` in the current directory.
pub fn default_log_path() -> PathBuf {
    PathBuf::from(format!("cardsheet_{}.log", Local::now().format("%Y%m%d_%H%M%S")))
}

/// Copies every formatted line to stderr and the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Build the logger described by `config` without installing it.
///
/// Returns the log file path when one was opened.
pub fn build_logger(config: &LogConfig) -> io::Result<(Logger, Option<PathBuf>)> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_CRATE_NAME"), config.level())
        .write_style(WriteStyle::Never)
        .parse_env(LOG_ENV);

    let mut log_file = None;
    if config.verbose {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        });
        let path = config.log_path.clone().unwrap_or_else(default_log_path);
        let file = File::create(&path)?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
        log_file = Some(path);
    } else {
        builder
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .target(Target::Stderr);
    }
    Ok((builder.build(), log_file))
}

/// Build and install the process-wide logger.
pub fn init_logging(config: &LogConfig) -> io::Result<Option<PathBuf>> {
    let (logger, path) = build_logger(config)?;
    let max = logger.filter();
    log::set_boxed_logger(Box::new(logger))
        .map_err(|err| io::Error::new(io::ErrorKind::AlreadyExists, err.to_string()))?;
    log::set_max_level(max);
    if let Some(path) = &path {
        log::debug!("Logging to {}", path.display());
    }
    Ok(path)
}
