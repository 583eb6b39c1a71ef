//! Tax calculator server binary.
//!
//! Serves the calculator front-end as static files, with `/health` and
//! `/status` endpoints, and shuts down gracefully on SIGTERM/SIGINT.
//!
//! Exit codes: 0 after a clean shutdown, 1 if the server cannot start
//! (missing index document, port in use, bad `PORT` value).

use std::process::ExitCode;

use taxcalc_server::{Server, ServerConfig};

mod logging;

use logging::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging(&LogConfig::default()) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match Server::new(config).run().await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed to start");
            ExitCode::FAILURE
        }
    }
}
