use softrobot_core::logging;
use softrobot_core::retry::{classify, RequestError};

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Log to file when possible; stderr otherwise.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = CliCommand::run_from_args().await {
        match err.downcast_ref::<RequestError>() {
            Some(req) => {
                let state = classify(req);
                tracing::debug!(kind = ?state.kind, "request failed: {}", req);
                match state.details {
                    Some(details) => eprintln!("softrobot error: {} ({})", state.message, details),
                    None => eprintln!("softrobot error: {}", state.message),
                }
            }
            None => eprintln!("softrobot error: {:#}", err),
        }
        std::process::exit(1);
    }
}
