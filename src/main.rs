use clap::Parser;
use std::io;
use std::process::ExitCode;

mod cli;
mod commands;
mod config;
mod dates;
mod models;
mod resolver;
#[cfg(test)]
mod test_server;
mod toggl;

use cli::Arguments;
use toggl::TogglError;

fn main() -> ExitCode {
    let args = match Arguments::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .quiet(args.quiet)
        .verbosity(args.verbose as usize + 1)
        .init()
    {
        eprintln!("warning: can't set up logging: {err}");
    }

    let mut stdout = io::stdout().lock();
    match commands::run(&args.command, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if err
                .downcast_ref::<TogglError>()
                .is_some_and(TogglError::is_unauthorized)
            {
                eprintln!("hint: check api_token in ${} or ~/.togglrc", config::RC_ENV_KEY);
            }
            ExitCode::FAILURE
        }
    }
}
