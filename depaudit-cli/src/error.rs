//! CLI-specific error types and exit code mapping

use depaudit_core::error::DepauditError;
use depaudit_graph::ScaError;
use depaudit_jas::JasError;

/// CLI-specific error type.
///
/// `exit_code()` maps each variant to the process exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// A scan ran but at least one scanner or module failed.
    #[error("scan error: {0}")]
    Scan(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from depaudit-core.
    #[error("{0}")]
    Core(#[from] DepauditError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning             |
    /// |------|---------------------|
    /// | 0    | Success             |
    /// | 1    | General / command   |
    /// | 2    | Configuration error |
    /// | 4    | Scan failure        |
    /// | 10   | IO error            |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(DepauditError::Config(_)) => 2,
            Self::Scan(_) => 4,
            Self::Io(_) | Self::Core(DepauditError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<JasError> for CliError {
    fn from(e: JasError) -> Self {
        match e {
            JasError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Scan(other.to_string()),
        }
    }
}

impl From<ScaError> for CliError {
    fn from(e: ScaError) -> Self {
        Self::Command(e.to_string())
    }
}
