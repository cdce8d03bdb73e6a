use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trend_core::{create_driver, schedule, Config, RunResult};

#[derive(Parser)]
#[command(name = "trend-compass")]
#[command(about = "Collect trending stories, draft a summary post and send it to your channels")]
#[command(after_help = "Examples:\n  trend-compass run\n  trend-compass schedule \"0 9 * * *\"")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run TrendCompass immediately (default)
    Run {
        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Schedule TrendCompass with an optional cron expression
    Schedule {
        /// Cron expression, e.g. "0 9 * * *" (defaults to the configured schedule)
        cron: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_core=info,trend_compass=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_result(result: &RunResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if result.success {
        println!("\n✅ {}", result.message);
    } else {
        println!("\n⚠ {}", result.message);
    }

    if let Some(draft) = &result.draft {
        println!("\n==================== DRAFT POST ====================");
        println!("{}", draft);
        println!("====================================================");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = Config::load().context("Failed to load configuration")?;
    config.log_summary();

    // Validate the notification settings before any network activity.
    let driver =
        create_driver(&config.notification).context("Invalid notification configuration")?;

    match args.command.unwrap_or(Command::Run { json: false }) {
        Command::Run { json } => {
            println!("🔍 Running TrendCompass...");
            let result = trend_core::run(&config, driver.as_ref()).await;
            print_result(&result, json)?;
        }
        Command::Schedule { cron } => {
            let cron = cron.unwrap_or_else(|| config.schedule.clone());
            println!("⏰ Scheduling TrendCompass with cron expression: {}", cron);

            let handle = schedule(Arc::new(config), &cron, |result| {
                println!("✓ Scheduled run completed: {}", result.message);
            })?;

            println!("Press Ctrl+C to stop the scheduler");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            tracing::info!("Received Ctrl+C");
            handle.stop().await;
        }
    }

    Ok(())
}
