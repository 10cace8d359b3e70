use std::io::{self, BufRead, IsTerminal, Write};

use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    diagnostics::Result,
    environment::HostEnvironment,
    runtime::{Evaluated, Runtime},
    source,
};

pub const PROMPT: &str = "> ";

/// Source name reported for lines typed at the prompt.
pub const INTERPRETER_SOURCE: &str = "Interpreter";

/// Read-evaluate-print loop over one persistent environment.
pub struct InteractiveShell<'a> {
    runtime: &'a mut Runtime,
    environment: &'a HostEnvironment,
}

impl<'a> InteractiveShell<'a> {
    pub fn new(runtime: &'a mut Runtime, environment: &'a HostEnvironment) -> Self {
        Self {
            runtime,
            environment,
        }
    }

    /// Uses the line editor on a terminal, plain reads from a pipe.
    pub fn run(&mut self) -> Result<()> {
        if io::stdin().is_terminal() {
            self.run_with_editor()
        } else {
            // Stdin is locked per line so the `readline` native can read it too.
            self.prompt_loop(
                |line| io::stdin().lock().read_until(b'\n', line),
                io::stdout(),
            )
        }
    }

    fn run_with_editor(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        let mut out = io::stdout();
        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.is_empty() {
                        editor.add_history_entry(line.as_str()).ok();
                    }
                    self.evaluate_line(&line, &mut out)?;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        writeln!(out)?;
        Ok(())
    }

    /// Prompt, read up to a newline, evaluate. Ends at end of input or on
    /// an empty line.
    pub fn run_plain<R: BufRead, W: Write>(&mut self, mut input: R, out: W) -> Result<()> {
        self.prompt_loop(|line| input.read_until(b'\n', line), out)
    }

    fn prompt_loop<W: Write>(
        &mut self,
        mut read_line: impl FnMut(&mut Vec<u8>) -> io::Result<usize>,
        mut out: W,
    ) -> Result<()> {
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            let mut line = Vec::new();
            read_line(&mut line)?;
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.is_empty() {
                break;
            }
            self.evaluate_line(&source::decode(&line), &mut out)?;
        }
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    fn evaluate_line(&mut self, line: &str, out: &mut impl Write) -> Result<()> {
        match self
            .environment
            .evaluate(self.runtime, line, INTERPRETER_SOURCE)
        {
            Evaluated::Ok(value) => {
                let rendered = self.environment.stringify(self.runtime, &value);
                writeln!(out, "{rendered}")?;
            }
            Evaluated::Threw { info, .. } => writeln!(out, "Exception: {}", info.message)?,
        }
        out.flush()?;
        Ok(())
    }
}
