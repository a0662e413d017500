//! webtty: WebSocket server giving each browser terminal its own shell.

mod cli;

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use webtty_common::WebTtyError;
use webtty_config::WebTtyConfig;
use webtty_server::{spawn_options, Registry, Server};

const DEFAULT_DIRECTIVE: &str = "webtty=info,webtty_server=info";

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    let loaded = webtty_config::load_config(args.config.as_deref());

    // RUST_LOG wins, then --log-level, then the config file.
    let directive = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.directive(),
        (None, Err(_)) => DEFAULT_DIRECTIVE.to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .init();

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "webtty exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: WebTtyConfig) -> Result<(), WebTtyError> {
    let options = spawn_options(&config).map_err(|e| WebTtyError::Pty(e.to_string()))?;
    let shell = options.program.clone();
    let registry = Registry::new(options);

    let server = Server::bind(config.server.listen_addr(), registry).await?;
    tracing::info!(addr = %server.local_addr()?, shell = %shell, "webtty listening");

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received");
                trigger.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Unable to listen for Ctrl-C"),
        }
    });

    server.run(shutdown).await;
    Ok(())
}
