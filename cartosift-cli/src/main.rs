//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use cartosift_cli::CliError;

fn main() {
    pretty_env_logger::init();
    match cartosift_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            log::debug!("{err:?}");
            eprintln!("cartosift: {err}");
            std::process::exit(1);
        }
    }
}
