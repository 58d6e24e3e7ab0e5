//! SkyVault - terminal client for a hosted auth + storage bucket
//!
//! Usage:
//!   skyvault --url https://<project>.supabase.co --anon-key <key> [--bucket user-files]
//!
//! Then type `help` at the prompt.

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use skyvault::terminal::{self, Command, TerminalSurface};
use skyvault::{AppController, Cli, SupabaseProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "skyvault=debug" } else { "skyvault=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config().context("Invalid configuration")?;
    tracing::info!("SkyVault starting against {}", config.backend.base_url());

    let provider = SupabaseProvider::new(config.backend);
    let surface = TerminalSurface::new(config.ui.download_dir.clone());
    let mut ctl = AppController::new(Box::new(provider), Box::new(surface), config.ui);

    ctl.check_current_session().await;

    let mut stdout = std::io::stdout();
    print!("{}", terminal::render(ctl.view()));

    loop {
        print!("skyvault:{}> ", ctl.current_path());
        stdout.flush().context("Failed to flush stdout")?;

        let Some(line) = terminal::read_stdin_line().context("Failed to read command")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if !terminal::run_command(&mut ctl, command, &mut stdout).await {
            break;
        }
        print!("{}", terminal::render(ctl.view()));
    }

    tracing::info!("SkyVault exiting");
    Ok(())
}
