//! Status command - counts of generated, published and pending images

use anyhow::{Context, Result};
use phrasecast_domain::PipelineStatus;
use std::path::PathBuf;

use crate::args::StatusArgs;
use crate::commands::build_pipeline;
use crate::config::AppConfig;

pub async fn execute(args: StatusArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let pipeline = build_pipeline(&config, true).await?;

    let status = pipeline
        .status()
        .await
        .context("Failed to read pipeline status")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}

fn print_status(status: &PipelineStatus) {
    println!("Images generated: {}", status.images_generated);
    println!("Images published: {}", status.images_published);
    println!("Images pending:   {}", status.images_pending);
    println!(
        "Next to publish:  {}",
        status.next_artifact.as_deref().unwrap_or("(none)")
    );
    println!(
        "Credentials:      {}",
        if status.credentials_configured {
            "configured"
        } else {
            "missing"
        }
    );
}
