use std::process::ExitCode;

fn main() -> ExitCode {
    rfmgrid_cli::run()
}
