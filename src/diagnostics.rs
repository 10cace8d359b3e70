use std::{fmt, io, path::PathBuf};

use boa_engine::JsError;
use rustyline::error::ReadlineError;
use thiserror::Error;

/// What the harness reads out of a value thrown by evaluated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub message: String,
    pub stack_trace: Option<Vec<String>>,
}

impl ExceptionInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: None,
        }
    }

    pub fn with_stack(mut self, stack: &str) -> Self {
        self.stack_trace = Some(stack.lines().map(str::to_owned).collect());
        self
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(stack) = &self.stack_trace {
            for line in stack {
                write!(f, "\n{line}")?;
            }
        }
        Ok(())
    }
}

/// Unified error type for the shell.
#[derive(Debug, Error)]
pub enum JscError {
    #[error("Could not open file: {}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Usage(String),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("could not serialize profiler output: {0}")]
    Profile(#[from] serde_json::Error),
    #[error("line editor error: {0}")]
    Readline(#[from] ReadlineError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<JsError> for JscError {
    fn from(err: JsError) -> Self {
        JscError::Engine(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JscError>;
