//! Exit code definitions for blobcopy
//!
//! Scripts rely on these values; changing one is a breaking change.

/// Exit codes for the blobcopy binary.
///
/// A run that finishes with per-object failures still exits with `Success`;
/// only configuration problems and fatal run errors produce a non-zero code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// Missing or invalid configuration
    UsageError = 2,

    /// Listing or network failure that aborted the run
    NetworkError = 3,

    /// Destination rejected the credentials
    AuthError = 4,

    /// Destination bucket does not exist
    NotFound = 5,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::NetworkError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            _ => None,
        }
    }

    /// Exit code matching a core error
    pub fn from_error(error: &bc_core::Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(Self::GeneralError)
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Run completed",
            Self::GeneralError => "General error",
            Self::UsageError => "Missing or invalid configuration",
            Self::NetworkError => "Network or listing failure",
            Self::AuthError => "Credentials rejected",
            Self::NotFound => "Destination bucket not found",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
