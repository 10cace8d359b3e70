//! Batch execution of the command line's script list.

use std::{borrow::Cow, io::Write, rc::Rc, time::Instant};

use tracing::debug;

use crate::{
    cli::Script,
    diagnostics::{ExceptionInfo, Result},
    environment::HostEnvironment,
    runtime::{Evaluated, Runtime},
    source,
};

/// Source name reported for `-e` scripts.
pub const COMMAND_LINE_SOURCE: &str = "[Command Line]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub elapsed_millis: Option<u64>,
    pub exception: Option<ExceptionInfo>,
}

/// Runs scripts against one environment, reporting to `out`.
pub struct ExecutionDriver<W: Write> {
    out: W,
    dump_bytecode: bool,
}

impl<W: Write> ExecutionDriver<W> {
    pub fn new(out: W, dump_bytecode: bool) -> Self {
        Self { out, dump_bytecode }
    }

    /// True iff every script loaded and evaluated without an exception.
    /// A script that cannot be read ends the run on the spot.
    pub fn run(
        &mut self,
        runtime: &mut Runtime,
        environment: &HostEnvironment,
        scripts: &[Script],
    ) -> bool {
        let host = Rc::clone(runtime.host());
        host.sampler().start();
        let mut success = true;
        for script in scripts {
            match self.execute(runtime, environment, script) {
                Ok(result) => success &= result.succeeded,
                Err(err) => {
                    debug!(script = script.payload(), "aborting run: {err}");
                    eprintln!("{err}");
                    success = false;
                    break;
                }
            }
        }
        host.sampler().stop();
        success
    }

    /// Loads and evaluates one script. `Err` only for load or output failures;
    /// exceptions thrown by the script are part of the [`ExecutionResult`].
    pub fn execute(
        &mut self,
        runtime: &mut Runtime,
        environment: &HostEnvironment,
        script: &Script,
    ) -> Result<ExecutionResult> {
        let buffer;
        let (name, text) = match script {
            Script::File(path) => {
                buffer = source::load(path)?;
                (path.as_str(), buffer.text())
            }
            Script::Inline(code) => (COMMAND_LINE_SOURCE, Cow::Borrowed(code.as_str())),
        };
        debug!(script = name, "evaluating");

        let host = Rc::clone(runtime.host());
        let instrumented = host.sampler().is_enabled() || host.is_profiling();
        let started = Instant::now();
        let window = host.sampler().window(name, host.sampling_flags());

        // Nothing from a thrown value outlives this match, so the next script
        // starts without a pending exception.
        let result = match environment.evaluate(runtime, &text, name) {
            Evaluated::Threw { info, .. } => {
                writeln!(self.out, "Exception: {}", info.message)?;
                if let Some(stack) = &info.stack_trace {
                    writeln!(self.out, "{}", stack.join("\n"))?;
                }
                ExecutionResult {
                    succeeded: false,
                    elapsed_millis: None,
                    exception: Some(info),
                }
            }
            Evaluated::Ok(value) => {
                if self.dump_bytecode {
                    let rendered = environment.stringify(runtime, &value);
                    writeln!(self.out, "End: {rendered}")?;
                }
                ExecutionResult {
                    succeeded: true,
                    elapsed_millis: None,
                    exception: None,
                }
            }
        };
        self.out.flush()?;
        drop(window);

        let elapsed_millis = instrumented
            .then(|| u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
        debug!(script = name, succeeded = result.succeeded, "finished");
        Ok(ExecutionResult {
            elapsed_millis,
            ..result
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
