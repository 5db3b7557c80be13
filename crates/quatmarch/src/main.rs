mod cli;
mod run;

use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::parse();
    run::initialise_tracing();
    match run::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if run::already_reported(&err) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
