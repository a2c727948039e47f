//! CLI errors and their exit codes.
//!
//! | code | meaning |
//! |------|---------|
//! | 0    | success |
//! | 2    | argument parse error, reported by clap before `run` |
//! | 10   | effect or scene rejected by the library |
//! | 11   | scene file could not be read |
//! | 12   | bad flag value: params JSON, blend mode, backend |
//! | 13   | output could not be serialized |

use keylight_core::KeylightError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Any library error except file access.
    #[error(transparent)]
    Effect(KeylightError),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    Input(String),

    #[error("cannot serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Effect(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }

    /// Error object printed to stderr in `--json` mode.
    pub fn to_json(&self) -> Value {
        json!({"error": self.to_string(), "exit_code": self.exit_code()})
    }
}

/// Scene file failures keep their own exit code; everything else the library
/// reports is an effect error.
impl From<KeylightError> for CliError {
    fn from(e: KeylightError) -> Self {
        match e {
            KeylightError::Io(msg) => CliError::Io(msg),
            other => CliError::Effect(other),
        }
    }
}
