use dsfetch_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; a read-only state dir must not stop a run.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    // Parse CLI and dispatch. Dataset failures are printed, not turned into an exit code.
    if let Err(err) = Cli::run_from_args().await {
        eprintln!("dsfetch error: {:#}", err);
        std::process::exit(1);
    }
}
