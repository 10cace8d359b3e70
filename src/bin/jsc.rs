use std::{
    env,
    io::{self, Write},
    panic,
    process::{self, ExitCode},
};

use jsc::{
    CommandLine, ExecutionDriver, HostEnvironment, InteractiveShell, Parsed, RunConfiguration,
    Runtime, cli, logging,
};
use tracing::debug;

/// Exit status for any failed script, unreadable file or crash.
const FAILURE_STATUS: u8 = 3;

fn main() -> ExitCode {
    logging::init();

    let args = env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned());
    let config = match CommandLine::parse(args) {
        Ok(Parsed::Run(config)) => config,
        Ok(Parsed::Help) => {
            eprint!("{}", cli::usage());
            return ExitCode::SUCCESS;
        }
        Ok(Parsed::DumpOptionsAndExit(options)) => {
            options.dump(&mut io::stderr()).ok();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}");
            eprint!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
    };

    ExitCode::from(run(config))
}

fn run(config: RunConfiguration) -> u8 {
    if config.dump_options {
        config.engine_options.dump(&mut io::stderr()).ok();
    }
    if config.crash_handlers {
        install_crash_handler();
    }

    let mut runtime = Runtime::new(config.engine_options.clone(), config.profile());
    let environment = match HostEnvironment::create(&mut runtime, &config.trailing_arguments) {
        Ok(environment) => environment,
        Err(err) => {
            eprintln!("{err}");
            return FAILURE_STATUS;
        }
    };

    let mut driver = ExecutionDriver::new(io::stdout(), config.dump_bytecode);
    let success = driver.run(&mut runtime, &environment, &config.scripts);
    if config.interactive && success {
        if let Err(err) = InteractiveShell::new(&mut runtime, &environment).run() {
            eprintln!("{err}");
        }
    }

    let status = if success { 0 } else { FAILURE_STATUS };
    if config.report_exit_code {
        println!("jsc exiting {status}");
    }

    if let Some(path) = &config.profile_output_path {
        if let Err(err) = runtime.host().save_profile(path) {
            debug!(path = %path.display(), "{err}");
            eprintln!("could not save profiler output.");
        }
    }
    let sampler = runtime.host().sampler();
    if sampler.is_enabled() && runtime.host().options().dump_sample_data() {
        sampler.dump(&mut io::stderr()).ok();
    }
    io::stdout().flush().ok();
    status
}

/// A panic anywhere ends the process at once with the failure status.
fn install_crash_handler() {
    panic::set_hook(Box::new(|info| {
        eprintln!("{info}");
        process::exit(i32::from(FAILURE_STATUS));
    }));
}
