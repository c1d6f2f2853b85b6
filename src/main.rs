use std::process::ExitCode;

fn main() -> ExitCode {
    octopus_consumption::observability::init_tracing();

    match octopus_consumption::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
