//! Translation of process arguments into a [`RunConfiguration`].

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::{
    diagnostics::{JscError, Result},
    options::EngineOptions,
};

/// One unit of work for the execution driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// A path, read when the driver reaches it.
    File(String),
    /// Source text given with `-e`.
    Inline(String),
}

impl Script {
    pub fn is_file(&self) -> bool {
        matches!(self, Script::File(_))
    }

    pub fn payload(&self) -> &str {
        match self {
            Script::File(payload) | Script::Inline(payload) => payload,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunConfiguration {
    pub scripts: Vec<Script>,
    pub interactive: bool,
    pub dump_bytecode: bool,
    pub profile_output_path: Option<PathBuf>,
    pub report_exit_code: bool,
    pub crash_handlers: bool,
    pub dump_options: bool,
    pub engine_options: EngineOptions,
    pub trailing_arguments: Vec<String>,
}

impl RunConfiguration {
    pub fn profile(&self) -> bool {
        self.profile_output_path.is_some()
    }
}

/// Outcome of parsing; only [`Parsed::Run`] continues to execution.
#[derive(Debug, Clone)]
pub enum Parsed {
    Run(RunConfiguration),
    Help,
    DumpOptionsAndExit(EngineOptions),
}

pub struct CommandLine;

impl CommandLine {
    /// Parses the arguments that follow the program name.
    pub fn parse<I, S>(args: I) -> Result<Parsed>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut config = RunConfiguration::default();
        let mut exit_after_options = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-f" => {
                    let path = required_value(&mut args, "-f")?;
                    config.scripts.push(Script::File(path));
                }
                "-e" => {
                    let code = required_value(&mut args, "-e")?;
                    config.scripts.push(Script::Inline(code));
                }
                "-i" => config.interactive = true,
                "-d" => config.dump_bytecode = true,
                "-p" => {
                    let path = required_value(&mut args, "-p")?;
                    config.profile_output_path = Some(PathBuf::from(path));
                }
                "-s" => config.crash_handlers = true,
                "-x" => config.report_exit_code = true,
                "--" => {
                    config.trailing_arguments.extend(args.by_ref());
                    break;
                }
                "-h" | "--help" => return Ok(Parsed::Help),
                "--options" => {
                    config.dump_options = true;
                    exit_after_options = true;
                }
                "--dumpOptions" => config.dump_options = true,
                _ => {
                    if let Some(assignment) = arg.strip_prefix("--") {
                        if config.engine_options.set_option(assignment) {
                            continue;
                        }
                    }
                    // Anything else, unknown long options included, names a file.
                    config.scripts.push(Script::File(arg));
                }
            }
        }

        if config.scripts.is_empty() {
            config.interactive = true;
        }

        if exit_after_options {
            return Ok(Parsed::DumpOptionsAndExit(config.engine_options));
        }
        Ok(Parsed::Run(config))
    }
}

fn required_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| JscError::Usage(format!("missing argument for `{flag}`")))
}

fn command() -> Command {
    Command::new("jsc")
        .override_usage("jsc [options] [files] [-- arguments]")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("dump")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Prints the completion value of every script"),
        )
        .arg(
            Arg::new("eval")
                .short('e')
                .value_name("code")
                .action(ArgAction::Append)
                .help("Evaluate argument as script code"),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .value_name("file")
                .action(ArgAction::Append)
                .help("Specifies a source file (deprecated)"),
        )
        .arg(
            Arg::new("help")
                .short('h')
                .long("help")
                .action(ArgAction::SetTrue)
                .help("Prints this help message"),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .action(ArgAction::SetTrue)
                .help("Enables interactive mode (default if no files are specified)"),
        )
        .arg(
            Arg::new("crash")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("Exits immediately with status 3 if the shell itself crashes"),
        )
        .arg(
            Arg::new("profile")
                .short('p')
                .value_name("file")
                .help("Outputs profiling data to a file"),
        )
        .arg(
            Arg::new("exit-code")
                .short('x')
                .action(ArgAction::SetTrue)
                .help("Output exit code before terminating"),
        )
        .arg(
            Arg::new("options")
                .long("options")
                .action(ArgAction::SetTrue)
                .help("Dumps all engine options and exits"),
        )
        .arg(
            Arg::new("dumpOptions")
                .long("dumpOptions")
                .action(ArgAction::SetTrue)
                .help("Dumps all engine options before continuing"),
        )
        .arg(
            Arg::new("files")
                .value_name("files")
                .action(ArgAction::Append)
                .help("Source files, run in order"),
        )
        .after_help("  --<engine option>=<value>  Sets the specified engine option")
}

/// The usage statement printed for `-h` and for malformed command lines.
pub fn usage() -> String {
    command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config(args: &[&str]) -> RunConfiguration {
        match CommandLine::parse(args.iter().copied()).expect("arguments should parse") {
            Parsed::Run(config) => config,
            other => panic!("expected a run configuration, found {other:?}"),
        }
    }

    #[test]
    fn empty_command_line_is_interactive() {
        let config = run_config(&[]);
        assert!(config.scripts.is_empty());
        assert!(config.interactive);
    }

    #[test]
    fn collects_scripts_in_encounter_order() {
        let config = run_config(&["-f", "a.js", "-e", "print(1)", "b.js"]);
        assert_eq!(
            config.scripts,
            vec![
                Script::File("a.js".into()),
                Script::Inline("print(1)".into()),
                Script::File("b.js".into()),
            ]
        );
        assert!(!config.interactive);
    }

    #[test]
    fn reads_flags() {
        let config = run_config(&["-i", "-d", "-x", "-s", "-p", "out.json", "-e", "1"]);
        assert!(config.interactive);
        assert!(config.dump_bytecode);
        assert!(config.report_exit_code);
        assert!(config.crash_handlers);
        assert!(config.profile());
        assert_eq!(config.profile_output_path, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn double_dash_ends_flag_parsing() {
        let config = run_config(&["-e", "1", "--", "-f", "x", "--help"]);
        assert_eq!(config.scripts.len(), 1);
        assert_eq!(config.trailing_arguments, vec!["-f", "x", "--help"]);
    }

    #[test]
    fn engine_options_are_consumed() {
        let config = run_config(&["--maxLoopIterations=7", "-e", "1"]);
        assert_eq!(config.engine_options.max_loop_iterations(), 7);
        assert_eq!(config.scripts.len(), 1);
    }

    #[test]
    fn unknown_long_option_becomes_a_file() {
        let config = run_config(&["--totallyUnknown"]);
        assert_eq!(config.scripts, vec![Script::File("--totallyUnknown".into())]);
        assert!(!config.interactive);
    }

    #[test]
    fn missing_flag_argument_is_a_usage_error() {
        for flag in ["-f", "-e", "-p"] {
            let err = CommandLine::parse([flag]).expect_err("flag without value");
            assert!(matches!(err, JscError::Usage(_)));
        }
    }

    #[test]
    fn help_and_options_stop_parsing() {
        assert!(matches!(
            CommandLine::parse(["-e", "1", "--help"]),
            Ok(Parsed::Help)
        ));
        assert!(matches!(
            CommandLine::parse(["--options", "-e", "1"]),
            Ok(Parsed::DumpOptionsAndExit(_))
        ));
        let config = run_config(&["--dumpOptions", "-e", "1"]);
        assert!(config.dump_options);
    }

    #[test]
    fn usage_mentions_every_flag() {
        let text = usage();
        for flag in ["-d", "-e", "-f", "-i", "-p", "-s", "-x", "--options", "--dumpOptions"] {
            assert!(text.contains(flag), "usage should mention {flag}: {text}");
        }
    }
}
