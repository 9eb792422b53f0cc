mod api;
mod cli;
mod config;
mod transfer;
mod tui;

use anyhow::Result;
use clap::Parser;
use recall_core::Session;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use cli::commands::{open_backend, run_cli};
use cli::opts::{Cli, Command};
use config::Config;
use tui::app::TuiApp;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    // The TUI owns the terminal; log lines would corrupt it.
    if !matches!(args.cmd, Command::Tui) {
        init_tracing();
    }
    let config = Config::load(args.config.as_deref())?;

    match &args.cmd {
        // Run TUI on its own runtime handle (no nested Tokio)
        Command::Tui => {
            let rt = Arc::new(Runtime::new()?);
            let backend = rt.block_on(open_backend(args.store, args.db_path.clone(), &config))?;
            let session = rt.block_on(Session::open(backend.repo))?;
            let mut app = TuiApp::new(session, backend.remote, rt);
            app.run()
        }
        _ => {
            let rt = Runtime::new()?;
            rt.block_on(run_cli(args, config))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
