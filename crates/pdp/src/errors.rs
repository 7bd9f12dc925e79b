//! Error classification and exit codes.

use pdp_core::constants::exit_codes;
use pdp_core::error::PdpError;

/// Errors raised by the binary itself.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A stage ran to the end but some of its tasks failed.
    #[error("{failed} {stage} task(s) failed")]
    StageFailed { stage: String, failed: usize },
}

/// Map a terminal error to the process exit code.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(AppError::StageFailed { .. }) = err.downcast_ref::<AppError>() {
        return exit_codes::ERROR_STAGE;
    }
    match err.downcast_ref::<PdpError>() {
        Some(e) if e.is_config() => exit_codes::ERROR_CONFIG,
        _ => exit_codes::ERROR_GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn stage_failure_code() {
        let err = anyhow::Error::new(AppError::StageFailed {
            stage: "align".into(),
            failed: 2,
        });
        assert_eq!(err.to_string(), "2 align task(s) failed");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn config_codes() {
        let err = anyhow::Error::new(PdpError::Config("bad".into()));
        assert_eq!(exit_code(&err), 4);
        let parse: anyhow::Result<()> =
            Err(PdpError::parse("g.json", "expected value")).context("loading collection");
        assert_eq!(exit_code(&parse.unwrap_err()), 4);
    }

    #[test]
    fn other_errors_are_generic() {
        let io = anyhow::Error::new(PdpError::io(
            "out",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ));
        assert_eq!(exit_code(&io), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
