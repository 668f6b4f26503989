use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use crate::cli::Cli;

/// Resolves `-q`/`-v`/`-d` into a level; quiet unless asked otherwise.
fn level(cli: &Cli) -> Level {
    if cli.debug {
        Level::Debug
    } else if cli.verbose {
        Level::Info
    } else if cli.quiet {
        Level::Error
    } else {
        Level::Warn
    }
}

/// A `simple_logger`-style formatter that appends to a file instead of
/// stderr, for `--logfile`.
struct FileLogger {
    level: Level,
    file: Mutex<File>,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{:<5} [{}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Initializes the `log` facade: `simple_logger` to stderr by default, or
/// a file-backed logger when `--logfile` is given.
pub fn init(cli: &Cli) -> anyhow::Result<()> {
    let level = level(cli);

    if let Some(path) = &cli.logfile {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::set_boxed_logger(Box::new(FileLogger {
            level,
            file: Mutex::new(file),
        }))?;
        log::set_max_level(LevelFilter::from(level));
    } else {
        simple_logger::init_with_level(level)?;
    }

    Ok(())
}
