mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use edgar_fetch::FetchSummary;
use edgar_fetch_http::ReqwestTransport;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "edgar-fetch")]
#[command(about = "Resumable, rate-limited downloader for SEC EDGAR filings")]
struct Cli {
    /// Config file (defaults to ~/.config/edgar-fetch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download quarterly master index files for the configured years
    Index,
    /// Build the filings list CSV from downloaded master indexes
    List,
    /// Download every filing on the filings list
    Download(DownloadArgs),
    /// Run index, list and download in sequence
    All(DownloadArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Re-download files that already exist
    #[arg(long)]
    overwrite: bool,
    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_transport(config: &AppConfig) -> Result<ReqwestTransport> {
    let transport = match config.timeout() {
        Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
        None => ReqwestTransport::new(),
    };
    Ok(transport)
}

fn print_summary(summary: &FetchSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!(
            "Downloaded {}, skipped {}, failed {}.",
            summary.downloaded, summary.skipped, summary.failed
        );
        if summary.failed > 0 {
            eprintln!("Re-run the same command to retry failed downloads.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let app_config = config::load_config(cli.config.as_deref())?;
    let transport = build_transport(&app_config)?;

    match cli.command {
        Command::Index => {
            let summary = commands::index::run(&app_config, transport).await?;
            print_summary(&summary, false)
        }
        Command::List => {
            let written = commands::list::run(&app_config)?;
            println!(
                "Wrote {written} filings to {}.",
                app_config.storage.filings_list.display()
            );
            Ok(())
        }
        Command::Download(args) => {
            let summary = commands::download::run(&app_config, transport, args.overwrite).await?;
            print_summary(&summary, args.json)
        }
        Command::All(args) => {
            let index = commands::index::run(&app_config, transport.clone()).await?;
            if !args.json {
                print_summary(&index, false)?;
            }
            commands::list::run(&app_config)?;
            let summary = commands::download::run(&app_config, transport, args.overwrite).await?;
            print_summary(&summary, args.json)
        }
    }
}
