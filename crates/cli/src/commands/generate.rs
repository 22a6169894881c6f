//! Generate command - render every phrase once and exit

use anyhow::{Context, Result};
use phrasecast_adapters::{phrases::CsvPhraseSource, store::FsArtifactStore};
use phrasecast_domain::{GenerationReport, usecases::GenerateUseCase};
use std::path::PathBuf;

use crate::args::GenerateArgs;
use crate::commands::build_backend;
use crate::config::AppConfig;

pub async fn execute(args: GenerateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = AppConfig::load(config_path.as_deref())?;
    if let Some(input) = args.input {
        config.general.input_path = input;
    }
    if let Some(content_dir) = args.content_dir {
        config.general.content_dir = content_dir;
    }

    let source = CsvPhraseSource::new(&config.general.input_path);
    let backend = build_backend(&config);
    let store = FsArtifactStore::new(&config.general.content_dir);

    let report = GenerateUseCase::new(&source, &backend, &store, config.template.layout.clone())
        .run()
        .await
        .context("Generation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &config);
    }

    Ok(())
}

fn print_report(report: &GenerationReport, config: &AppConfig) {
    println!(
        "Generated {} of {} images into {}",
        report.generated,
        report.entries,
        config.general.content_dir.display()
    );
    if report.skipped > 0 {
        println!("  Skipped (blank phrase): {}", report.skipped);
    }
    if report.failed() > 0 {
        println!(
            "  Failed: {} (render: {}, write: {})",
            report.failed(),
            report.render_failed,
            report.store_failed
        );
    }
    for artifact in &report.artifacts {
        println!("  {}", artifact);
    }
}
