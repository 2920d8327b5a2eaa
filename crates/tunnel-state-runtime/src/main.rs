//! tunnel-stated: hosts one tunnel state reconciliation session.
//! Reads JSON-lines inputs (service notifications and user intent), writes
//! every committed state as a JSON line to stdout. Logs go to stderr.

use clap::Parser;
use tokio::io::BufReader;

mod cli;
mod clock;
mod output;
mod session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("TUNNEL_STATE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = args.timing.reconciler_config();
    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Run(cli::RunOpts::default()));
    let mut stdout = tokio::io::stdout();

    match command {
        cli::Command::Run(opts) => {
            tracing::info!(
                debounce_ms = args.timing.debounce_ms,
                fallback_timeout_ms = args.timing.fallback_timeout_ms,
                "tunnel state session starting"
            );
            let clock = clock::TokioClock::new();
            session::run_live(
                BufReader::new(tokio::io::stdin()),
                &mut stdout,
                config,
                &clock,
                session::LiveOptions {
                    drain_on_eof: opts.drain_on_eof,
                },
                shutdown_signal(),
            )
            .await?;
            tracing::info!("tunnel state session stopped");
        }
        cli::Command::Replay(opts) => {
            session::run_replay(&opts.path, &mut stdout, config).await?;
        }
    }

    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                tracing::info!("received ctrl-c, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}
