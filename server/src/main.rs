mod cli;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use shotlog::http::{router, serve};
use shotlog::login::{run_gate, LoginThrottle, TerminalPrompt};
use shotlog::sanitize::redact_database_url;
use shotlog::{ConfigError, Database, IngestService, LoginError};

use crate::cli::Cli;
use crate::error::ServerError;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = cli::load_dotenv();
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ServerError::Login(LoginError::Locked { .. })) => {
            // The gate already told the operator.
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Server stopped");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let settings = cli.settings()?;
    info!("Starting shotlog-server v{}", env!("CARGO_PKG_VERSION"));

    let credentials = settings
        .login
        .credentials()
        .ok_or_else(|| ConfigError::Validation {
            message: "APP_PASS_HASH is not set".to_string(),
        })?;
    let mut throttle = LoginThrottle::new(settings.login.policy());

    // Nothing else is running yet, so the blocking prompt is harmless here.
    run_gate(&mut TerminalPrompt, &credentials, &mut throttle).await?;

    info!(
        database = %redact_database_url(&settings.database_url),
        "Opening database"
    );
    let db = Database::open_url(&settings.database_url)?;

    info!(data_root = %settings.data_root.display(), "Serving datasets");
    let service = IngestService::new(settings.data_root.clone(), db);
    let app = router(service);

    let addr = settings.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Listening on http://{}", addr);

    serve(listener, app, shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
