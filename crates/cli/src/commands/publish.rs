//! Publish command - run one publication cycle now

use anyhow::{Context, Result};
use phrasecast_domain::{PublishReport, usecases::PublishCycleError};
use std::path::PathBuf;

use crate::args::PublishArgs;
use crate::commands::build_pipeline;
use crate::config::AppConfig;

pub async fn execute(args: PublishArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let dry_run = args.dry_run || config.general.dry_run;

    let pipeline = build_pipeline(&config, dry_run).await?;

    match pipeline.publish_next().await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(PublishCycleError::NoPendingArtifacts) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "published": false,
                        "reason": "no pending artifacts",
                    }))?
                );
            } else {
                println!("Nothing to publish: every generated image has been published.");
                println!("Run 'phrasecast ledger reset' to start over.");
            }
            Ok(())
        }
        Err(e) => Err(e).context("Publication failed"),
    }
}

fn print_report(report: &PublishReport) {
    if report.dry_run {
        println!("[dry run] Would publish {}", report.artifact);
    } else {
        println!("Published {}", report.artifact);
    }
    println!("  Caption: {}", report.caption);
    if let Some(ref id) = report.remote_id {
        println!("  Media ID: {}", id);
    }
    if let Some(ref url) = report.remote_url {
        println!("  URL: {}", url);
    }
}
