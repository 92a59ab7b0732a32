//! Codeloom CLI and REST API entry point.
//!
//! Binary name: `loom`
//!
//! Parses CLI arguments, initializes tracing, database and services, then
//! dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use codeloom_infra::filesystem::resolve_data_dir;
use codeloom_observe::tracing_setup::{LogFormat, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, KeyCommand, ProjectCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,codeloom=debug",
        _ => "trace",
    };
    if let Err(e) = init_tracing(filter, LogFormat::from_json_flag(cli.log_json), cli.otel) {
        eprintln!("Warning: tracing init failed: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "loom", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let state = AppState::init(&data_dir).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if state.chat_service.is_none() {
                println!(
                    "  {} No {} key found in ${}; /api/v1/chat will answer with errors",
                    console::style("!").yellow().bold(),
                    state.config.provider.kind,
                    state.config.provider.api_key_env()
                );
            }
            println!(
                "  {} Codeloom API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());
            tracing::info!(
                %addr,
                provider = %state.config.provider.kind,
                data_dir = %state.data_dir.display(),
                "server started"
            );

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Chat { user, out } => {
            cli::chat::run_chat(&state, &user, out.as_deref(), cli.json).await?;
        }

        Commands::Project { action } => match action {
            ProjectCommand::Show { user } => {
                cli::project::show_project(&state, &user, cli.json).await?;
            }
            ProjectCommand::Reset { user } => {
                cli::project::reset_project(&state, &user, cli.json).await?;
            }
            ProjectCommand::Export { dir, user } => {
                cli::project::export(&state, &user, &dir, cli.json).await?;
            }
            ProjectCommand::Remove { file, user } => {
                cli::project::remove_file(&state, &user, &file, cli.json).await?;
            }
        },

        Commands::Key { action } => match action {
            KeyCommand::Create { user, name } => {
                cli::key::create_key(&state, &user, &name, cli.json).await?;
            }
            KeyCommand::List { user } => {
                cli::key::list_keys(&state, &user, cli.json).await?;
            }
            KeyCommand::Revoke { id } => {
                cli::key::revoke_key(&state, &id, cli.json).await?;
            }
        },

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
