//! opsdesk CLI and relay entry point.
//!
//! Binary name: `opsdesk`
//!
//! Parses CLI arguments, loads settings, then dispatches to the command
//! handler or starts the CORS relay.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::settings::{GleanUpdate, JiraUpdate};
use cli::ticket::CreateArgs;
use cli::{Cli, Commands, ErpAction, SettingsAction, TicketAction};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    opsdesk_observe::tracing_setup::init_tracing(cli.verbose, cli.quiet, cli.json)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    // Shell completions don't need settings
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "opsdesk", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await;

    match cli.command {
        Commands::Ask {
            question,
            erp,
            stream,
            format,
        } => {
            let question = question.join(" ");
            cli::ask::ask(
                &state,
                &question,
                erp.as_deref(),
                stream,
                format,
                cli.json,
                cli.quiet,
            )
            .await?;
        }

        Commands::Listen { erp } => {
            cli::listen::listen(&state, erp.as_deref()).await?;
        }

        Commands::Erp { action } => match action {
            ErpAction::List => cli::erp::list_erps(cli.json)?,
            ErpAction::Show { name } => cli::erp::show_erp(&name, cli.json)?,
        },

        Commands::Ticket { action } => match action {
            TicketAction::Create {
                form,
                summary,
                description,
                issue_type,
                values,
            } => {
                let args = CreateArgs {
                    form,
                    summary,
                    description,
                    issue_type,
                    values,
                };
                cli::ticket::create(&state, args, cli.json).await?;
            }
            TicketAction::Fields { issue_type_id } => {
                cli::ticket::fields(&state, &issue_type_id, cli.json).await?;
            }
            TicketAction::Forms => cli::ticket::forms(&state, cli.json)?,
        },

        Commands::Settings { action } => match action {
            SettingsAction::Show => cli::settings::show(&state, cli.json)?,
            SettingsAction::SetGlean {
                token,
                backend,
                email,
                relay_url,
            } => {
                let update = GleanUpdate {
                    token,
                    backend,
                    email,
                    relay_url,
                };
                cli::settings::set_glean(&state, update, cli.json).await?;
            }
            SettingsAction::SetJira {
                domain,
                email,
                token,
                project,
                relay_url,
            } => {
                let update = JiraUpdate {
                    domain,
                    email,
                    token,
                    project,
                    relay_url,
                };
                cli::settings::set_jira(&state, update, cli.json).await?;
            }
        },

        Commands::Serve { port, host } => {
            let relay = &state.settings.relay;
            let host = host.unwrap_or_else(|| relay.host.clone());
            let port = port.unwrap_or(relay.port);
            let relay_state = http::relay::RelayState::new(relay, &state.settings.jira)?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} opsdesk relay listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!(
                    "  {} {}",
                    console::style("CORS origin:").dim(),
                    relay.allowed_origin
                );
                match relay_state.jira_base() {
                    Some(base) => println!("  {} {base}", console::style("Issue tracker:").dim()),
                    None => println!(
                        "  {}",
                        console::style("Issue tracker: not configured (only /glean/ is relayed)")
                            .dim()
                    ),
                }
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }
            tracing::info!(%addr, "relay started");

            let router = http::router::build_router(relay_state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Relay stopped.");
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
///
/// A signal handler that cannot be installed never fires; the other one
/// still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
