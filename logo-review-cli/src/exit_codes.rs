//! Exit codes following sysexits.h conventions.
//!
//! Scripts driving a review batch can tell a bad link from an outage.

use logo_review_core::LogoReviewError;

/// Successful execution.
pub const SUCCESS: u8 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: u8 = 1;

/// Invalid search parameters.
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: u8 = 64;

/// Robotoff unreachable, or a request it rejected.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: u8 = 69;

/// Invalid endpoint or environment configuration.
/// Maps to EX_CONFIG from sysexits.h.
pub const CONFIG_ERROR: u8 = 78;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: u8,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify by the first library error in the chain
        let code = match err
            .chain()
            .find_map(|cause| cause.downcast_ref::<LogoReviewError>())
        {
            Some(LogoReviewError::InvalidParams(_)) => USAGE_ERROR,
            Some(LogoReviewError::Config(_)) => CONFIG_ERROR,
            Some(_) => NETWORK_ERROR,
            None => GENERAL_ERROR,
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(exit: ExitCode) -> Self {
        std::process::ExitCode::from(exit.code)
    }
}
