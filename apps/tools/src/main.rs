use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use storage::{open_state_store, StateStore};
use tracing_subscriber::EnvFilter;
use tracker::{balance::recommend_totals, format_hms, Tracker};

#[derive(Parser, Debug)]
#[command(about = "Inspect and drive the mode tracker session")]
struct Cli {
    #[arg(long, env = "STATE_URL", default_value = "./data/user_modes.json")]
    state_url: String,
    #[arg(long, default_value_t = 5_000)]
    storage_timeout_ms: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a chat command such as `/hacker` and print the reply.
    Send { text: String },
    /// Same as `send /summary`.
    Summary,
    /// Print the stored record with elapsed time flushed in.
    Show,
    /// Delete the stored record.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = open_state_store(&cli.state_url)
        .await
        .with_context(|| format!("failed to open state store '{}'", cli.state_url))?;
    let tracker = Tracker::new(Arc::clone(&store))
        .with_storage_timeout(Duration::from_millis(cli.storage_timeout_ms));

    match cli.command {
        Command::Send { text } => {
            println!("{}", tracker.handle_now(&text).await?);
        }
        Command::Summary => {
            println!("{}", tracker.handle_now("/summary").await?);
        }
        Command::Show => {
            let state = tracker.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
            let rec = recommend_totals(&state.total_time);
            for entry in &rec.entries {
                println!(
                    "{:<8} logged {}  to add {}",
                    entry.mode.label(),
                    format_hms(state.total_time.get(entry.mode)),
                    format_hms(entry.seconds)
                );
            }
        }
        Command::Reset => {
            tracker.reset().await?;
            println!("session reset ({})", store.describe());
        }
    }

    Ok(())
}
