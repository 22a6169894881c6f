//! Doctor command - validate configuration and show status

use anyhow::Result;
use phrasecast_adapters::{
    ledger::SqliteLedger, phrases::CsvPhraseSource, store::FsArtifactStore,
};
use phrasecast_domain::{ArtifactStore, PhraseSource, PublicationLedger};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::commands::{build_backend, load_credentials};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    input: CheckResult,
    content_dir: CheckResult,
    ledger: CheckResult,
    assets: CheckResult,
    credentials: CheckResult,
    schedule: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self::with_status("ok", message)
    }

    fn warn(message: impl Into<String>) -> Self {
        Self::with_status("warn", message)
    }

    fn error(message: impl Into<String>) -> Self {
        Self::with_status("error", message)
    }

    fn with_status(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let not_checked = || CheckResult::error("Not checked");
    let mut report = DoctorReport {
        config: not_checked(),
        input: not_checked(),
        content_dir: not_checked(),
        ledger: not_checked(),
        assets: not_checked(),
        credentials: not_checked(),
        schedule: not_checked(),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.input = check_input(&config.general.input_path).await;
        report.content_dir = check_content_dir(&config.general.content_dir).await;
        report.ledger = check_ledger(&config.general.state_db_path).await;
        report.assets = check_assets(config);
        report.credentials = check_credentials(config);
        report.schedule = check_schedule(config);
    }

    let checks = [
        &report.config,
        &report.input,
        &report.content_dir,
        &report.ledger,
        &report.assets,
        &report.credentials,
        &report.schedule,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_input(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::error(format!("Phrase file does not exist: {}", path.display()));
    }

    match CsvPhraseSource::new(path).load().await {
        Ok(entries) => {
            let usable = entries.iter().filter(|e| !e.is_blank()).count();
            if usable == 0 {
                return CheckResult::warn(format!("No usable phrases in {}", path.display()));
            }

            CheckResult::ok(format!(
                "{} rows, {} with a phrase ({})",
                entries.len(),
                usable,
                path.display()
            ))
            .with_details(serde_json::json!({
                "rows": entries.len(),
                "usable": usable,
            }))
        }
        Err(e) => CheckResult::error(format!("Failed to read phrases: {}", e)),
    }
}

async fn check_content_dir(dir: &Path) -> CheckResult {
    if !dir.exists() {
        return CheckResult::warn(format!(
            "Content directory does not exist yet: {} (created on first generation)",
            dir.display()
        ));
    }

    match FsArtifactStore::new(dir).list_all().await {
        Ok(artifacts) => CheckResult::ok(format!(
            "{} images in {}",
            artifacts.len(),
            dir.display()
        ))
        .with_details(serde_json::json!({ "count": artifacts.len() })),
        Err(e) => CheckResult::error(format!("Cannot list content directory: {}", e)),
    }
}

async fn check_ledger(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::ok(format!(
            "Ledger will be created at {}",
            path.display()
        ));
    }

    let ledger = match SqliteLedger::new(path).await {
        Ok(ledger) => ledger,
        Err(e) => return CheckResult::error(format!("Cannot open ledger: {}", e)),
    };

    match ledger.list().await {
        Ok(records) => CheckResult::ok(format!("{} images published", records.len())).with_details(
            serde_json::json!({
                "published": records.len(),
                "last": records.last().map(|r| &r.artifact_name),
            }),
        ),
        Err(e) => CheckResult::error(format!("Cannot read ledger: {}", e)),
    }
}

fn check_assets(config: &AppConfig) -> CheckResult {
    let backend = build_backend(config);
    let mut missing = Vec::new();

    match (&config.template.font_path, backend.has_font()) {
        (None, _) => missing.push("no font configured, using built-in bitmap font".to_string()),
        (Some(path), false) => missing.push(format!("font unusable: {}", path.display())),
        (Some(_), true) => {}
    }
    match (&config.template.logo_path, backend.has_logo()) {
        (None, _) => missing.push("no logo configured".to_string()),
        (Some(path), false) => missing.push(format!("logo unusable: {}", path.display())),
        (Some(_), true) => {}
    }

    if missing.is_empty() {
        CheckResult::ok("Font and logo loaded")
    } else {
        CheckResult::warn(missing.join("; "))
    }
}

fn check_credentials(config: &AppConfig) -> CheckResult {
    let instagram = &config.instagram;

    match instagram.publisher.trim() {
        "stub" => return CheckResult::warn("Publisher: stub (nothing is sent to Instagram)"),
        "instagram" => {}
        other => return CheckResult::error(format!("Unknown publisher: {}", other)),
    }

    if instagram.username_env.trim().is_empty() || instagram.password_env.trim().is_empty() {
        return CheckResult::error("No credential env vars configured");
    }

    // Never reveal the values
    match load_credentials(config) {
        Some(credentials) => CheckResult::ok(format!(
            "Account: {} ({}, {} set)",
            credentials.username, instagram.username_env, instagram.password_env
        )),
        None => CheckResult::warn(format!(
            "{} / {} not set; publication cycles will fail",
            instagram.username_env, instagram.password_env
        )),
    }
}

fn check_schedule(config: &AppConfig) -> CheckResult {
    match config.schedule.daily() {
        Ok(schedule) => {
            let next = schedule.next_after(time::OffsetDateTime::now_utc());
            CheckResult::ok(format!(
                "Daily at {} UTC, next: {}",
                config.schedule.publish_at, next
            ))
        }
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("phrasecast Doctor Report");
    println!("========================");
    println!();

    print_check("Config", &report.config);
    print_check("Input", &report.input);
    print_check("Content", &report.content_dir);
    print_check("Ledger", &report.ledger);
    print_check("Assets", &report.assets);
    print_check("Credentials", &report.credentials);
    print_check("Schedule", &report.schedule);

    println!();
    println!("{} Overall: {}", symbol(&report.overall), report.overall.to_uppercase());

    if report.overall != "error" {
        println!();
        println!("Ready to run! Try: phrasecast generate && phrasecast publish --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("{} {}: {}", symbol(&result.status), name, result.message);
}

fn symbol(status: &str) -> &'static str {
    match status {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    }
}
