//! Tracing subscriber setup.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::CommonArgs;

/// Default level: WARN, or INFO with `--verbose`. `RUST_LOG` overrides both.
#[must_use]
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level(verbose).into())
        .from_env_lossy()
}

fn open_logfile(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("could not create log file {}", path.display()))
}

/// Install the global subscriber: stderr always, plus `--logfile` if given.
pub fn init(common: &CommonArgs) -> Result<()> {
    let file_layer = match common.logfile.as_deref() {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_logfile(path)?)),
        ),
        None => None,
    };
    tracing_subscriber::registry()
        .with(env_filter(common.verbose))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("could not install log subscriber")?;
    tracing::debug!(logfile = ?common.logfile, "logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_level(false), LevelFilter::WARN);
        assert_eq!(default_level(true), LevelFilter::INFO);
    }

    #[test]
    fn missing_log_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_logfile(&dir.path().join("no/such/dir/pdp.log")).unwrap_err();
        assert!(err.to_string().contains("pdp.log"));
    }
}
