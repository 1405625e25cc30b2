// src/main.rs

use anyhow::Context;
use axum::serve;
use clap::Parser;
use settings_admin::{
    build_application_state,
    cli::{Cli, Commands},
    run, setup_configuration,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => { info!(signal = "Ctrl+C", "Received signal. Initiating graceful shutdown...") },
        () = terminate => { info!(signal = "Terminate", "Received signal. Initiating graceful shutdown...") },
    }
}

fn init_tracing(cli: &Cli) {
    let env_filter =
        EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn serve_command(cli: &Cli) -> anyhow::Result<()> {
    let (app, config) = run(cli.config.clone())
        .await
        .context("application setup failed")?;

    let port = cli.port.unwrap_or(config.server.port);
    let listener = TcpListener::bind((config.server.host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind to {}:{port}", config.server.host))?;
    let addr = listener.local_addr()?;
    info!(server.address = %addr, "Server listening");

    serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server run loop failed")?;

    info!("Server shut down gracefully.");
    Ok(())
}

fn check_command(cli: &Cli, file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let path = file.map(ToOwned::to_owned).or_else(|| cli.config.clone());
    let config = setup_configuration(path).context("configuration is invalid")?;
    println!(
        "Configuration OK (store: {}, port: {}, defaults: {})",
        config.store.backend,
        config.server.port,
        config.defaults.len()
    );
    Ok(())
}

async fn show_command(cli: &Cli) -> anyhow::Result<()> {
    let config = setup_configuration(cli.config.clone())?;
    let state = build_application_state(config).await?;
    let (_, record) = state.settings.show_settings_form().await?;
    println!("{}", serde_json::to_string_pretty(&record.masked())?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.effective_command() {
        Commands::Serve => serve_command(&cli).await,
        Commands::Check { file } => check_command(&cli, file.as_deref()),
        Commands::Show => show_command(&cli).await,
    }
}
