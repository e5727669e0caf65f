// src/cli/mod.rs

pub mod actions;
pub mod context;
pub mod driver;
pub mod options;
pub mod rest;

use thiserror::Error;

use crate::cli::actions::ActionError;
use crate::cli::options::OptionsError;

/// The failures the driver can surface, each carrying the process exit code
/// the entry point should report.
#[derive(Error, Debug)]
pub enum CliError {
    /// The command line could not be understood: missing noun, bad option,
    /// unsupported noun or environment.
    #[error("{0}")]
    Usage(String),

    /// The requested output destination could not be used.
    #[error("{0}")]
    OutputTarget(String),

    /// The selected action refused the invocation or failed while running.
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl From<OptionsError> for CliError {
    fn from(e: OptionsError) -> Self {
        Self::Usage(e.to_string())
    }
}

impl CliError {
    /// The process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Action(_) => 1,
            Self::OutputTarget(_) => 2,
        }
    }
}
