//! Error type shared by the pipeline crates.

use std::path::{Path, PathBuf};

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PdpError {
    /// Malformed input descriptor or invalid option. Fatal before dispatch.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error with the path that caused it.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A structured input file could not be parsed.
    #[error("could not parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// An alignment violated the equal-length requirement or was empty.
    #[error("alignment error in {path}: {message}")]
    Alignment { path: PathBuf, message: String },

    /// Two partial mappings claimed the same key.
    #[error("duplicate key {0:?} while merging worker outputs")]
    DuplicateKey(String),

    /// An external tool could not be started.
    #[error("could not run {program}: {message}")]
    Tool { program: String, message: String },
}

impl PdpError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a parse error for `path`.
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the fail-fast configuration class.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Parse { .. })
    }
}

/// Convenience alias used across the pipeline crates.
pub type Result<T> = std::result::Result<T, PdpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_path() {
        let err = PdpError::io(
            "genomes/a.fna",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("genomes/a.fna"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn config_class() {
        assert!(PdpError::Config("bad".into()).is_config());
        assert!(PdpError::parse("x.json", "eof").is_config());
        assert!(!PdpError::DuplicateKey("p1".into()).is_config());
    }
}
