//! Ledger command - inspect or reset the publication ledger

use anyhow::{Context, Result, bail};
use phrasecast_adapters::ledger::SqliteLedger;
use phrasecast_domain::PublicationLedger;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::args::{LedgerArgs, LedgerCommands};
use crate::commands::build_pipeline;
use crate::config::AppConfig;

pub async fn execute(args: LedgerArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    match args.command {
        LedgerCommands::List { json } => list(&config, json).await,
        LedgerCommands::Reset { yes } => reset(&config, yes).await,
    }
}

async fn list(config: &AppConfig, json: bool) -> Result<()> {
    let ledger = SqliteLedger::new(&config.general.state_db_path)
        .await
        .context("Failed to open publication ledger")?;
    let records = ledger.list().await.context("Failed to read ledger")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No images published yet.");
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {}  {}",
            record.published_at.date(),
            record.artifact_name,
            record.remote_url.as_deref().unwrap_or(&record.remote_id)
        );
    }
    println!();
    println!("{} published", records.len());

    Ok(())
}

async fn reset(config: &AppConfig, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!(
        "Forget every publication recorded in {}? [y/N] ",
        config.general.state_db_path.display()
    ))? {
        bail!("Reset cancelled");
    }

    let pipeline = build_pipeline(config, true).await?;
    let removed = pipeline
        .reset_ledger()
        .await
        .context("Failed to reset ledger")?;

    println!("Removed {} publication record(s).", removed);
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
