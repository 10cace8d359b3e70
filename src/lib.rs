//! Command-line shell around an embedded JavaScript engine: argument
//! parsing, host environments with native bindings, batch execution and an
//! interactive prompt.

pub mod cli;
pub mod diagnostics;
pub mod driver;
pub mod environment;
pub mod logging;
pub mod options;
pub mod profiler;
pub mod repl;
pub mod runtime;
pub mod source;
mod stdlib;

pub use cli::{CommandLine, Parsed, RunConfiguration, Script};
pub use diagnostics::{ExceptionInfo, JscError, Result};
pub use driver::{ExecutionDriver, ExecutionResult};
pub use environment::HostEnvironment;
pub use options::EngineOptions;
pub use repl::InteractiveShell;
pub use runtime::{Evaluated, Runtime};
