use std::process::ExitCode;

use error_stack::{Report, ResultExt};
use log::LevelFilter;

use signed_request_common::error::SigningError;
use signed_request_common::logging::init_logging;
use signed_request_common::settings::Settings;
use signed_request_server::create_router;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging(LevelFilter::Info) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            log::error!("Server failed: {:?}", report);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Report<SigningError>> {
    let settings = Settings::new()?;
    let router = create_router(&settings)?;

    let bind_address = settings.server.bind_address.as_str();
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .change_context(SigningError::Configuration {
            message: format!("Failed to bind {}", bind_address),
        })?;

    log::info!(
        "Listening on {} (timestamp tolerance {}s, body limit {} bytes)",
        bind_address,
        settings.server.timestamp_tolerance_secs,
        settings.server.max_body_bytes
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .change_context(SigningError::Configuration {
            message: "Server terminated unexpectedly".into(),
        })?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
    }
}
