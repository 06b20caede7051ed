//! Error handling for the biu CLI

use std::path::PathBuf;

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Validation or emission error
    #[error("{0}")]
    Compiler(#[from] biu_compiler::CompilerError),

    /// Probe or energy-table error
    #[error("{0}")]
    Storage(#[from] biu_storage::StorageError),

    /// Model or record error
    #[error("{0}")]
    Ir(#[from] biu_ir::IrError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine exited with a non-zero status
    #[error("Engine failed with {}; see {stderr_path:?}{}", code_text(.code), tail_text(.stderr_tail))]
    EngineFailed {
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured stderr log
        stderr_path: PathBuf,
        /// Last lines of stderr
        stderr_tail: String,
    },

    /// The engine ran past its time limit and was killed
    #[error("Engine exceeded {secs}s timeout and was terminated; see {stderr_path:?}")]
    EngineTimeout {
        /// Limit in seconds
        secs: u64,
        /// Captured stderr log
        stderr_path: PathBuf,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("Error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Missing required file or resource
    #[error("Missing resource: {0}")]
    MissingResource(String),
}

fn code_text(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "termination by signal".to_string(),
    }
}

fn tail_text(tail: &str) -> String {
    if tail.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", tail.trim_end())
    }
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Create a missing resource error
    pub fn missing_resource(msg: impl Into<String>) -> Self {
        Self::MissingResource(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failure_message_carries_tail() {
        let err = CliError::EngineFailed {
            code: Some(3),
            stderr_path: "/w/logs/engine_stderr.log".into(),
            stderr_tail: "bad config\n".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"));
        assert!(msg.ends_with("\nbad config"));
    }
}
