//! Focus Timer CLI
//!
//! Alternates focused work phases with breaks:
//! - 25 minutes of work and 5 minutes of break by default
//! - a cycle of 1 to 5 work sessions
//! - manual mode and open-ended Flow sessions
//!
//! `focustimer daemon` owns the timer; every other subcommand talks to it
//! over a Unix socket.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use focustimer::cli::{Cli, Commands, Display, FlowAction, IpcClient, TaskAction};
use focustimer::daemon::{self, default_socket_path};
use focustimer::stats::JsonFileStore;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let socket = cli.socket;
    let client = || IpcClient::from_option(socket.clone());

    match command {
        Commands::Start => Display::show_result(&client()?.start().await?),
        Commands::Pause => Display::show_result(&client()?.pause().await?),
        Commands::Status => Display::show_status(&client()?.status().await?),
        Commands::Config(args) => {
            Display::show_result(&client()?.configure(args.to_params()).await?);
        }
        Commands::Advance => Display::show_result(&client()?.advance().await?),
        Commands::Flow { action } => {
            let client = client()?;
            let response = match action {
                FlowAction::Enter => client.flow_enter().await?,
                FlowAction::Complete => client.flow_complete().await?,
            };
            Display::show_result(&response);
        }
        Commands::Task {
            action: TaskAction::Done,
        } => Display::show_stats(&client()?.task_done().await?),
        Commands::Focus(args) => Display::show_result(&client()?.focus(args.task()).await?),
        Commands::Stats => Display::show_stats(&client()?.stats().await?),
        Commands::ResetStats { yes: false } => {
            anyhow::bail!(
                "統計のリセットには確認が必要です。'focustimer reset-stats --yes' を実行してください"
            );
        }
        Commands::ResetStats { yes: true } => {
            Display::show_stats(&client()?.reset_stats(true).await?);
        }
        Commands::Daemon(args) => {
            let socket_path = match &socket {
                Some(path) => path.clone(),
                None => default_socket_path().context(
                    "ホームディレクトリが見つかりません。--socket でソケットを指定してください",
                )?,
            };
            let default_counter_path = match JsonFileStore::at_default_path() {
                Ok(store) => Some(store.path().to_path_buf()),
                Err(e) => {
                    tracing::warn!("{} (カウンターはメモリ上のみで保持します)", e);
                    None
                }
            };
            daemon::run(args.into_settings(socket_path, default_counter_path)).await?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
