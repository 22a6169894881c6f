//! Serve command - startup generation, HTTP endpoints and the daily publish loop

use anyhow::{Context, Result};
use phrasecast_domain::{
    SystemClock,
    usecases::{TokioSleeper, run_schedule},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::args::ServeArgs;
use crate::commands::build_pipeline;
use crate::config::AppConfig;
use crate::server;

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let dry_run = args.dry_run || config.general.dry_run;
    let schedule = config.schedule.daily()?;
    let addr: SocketAddr = match args.bind.as_deref() {
        Some(bind) => bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", bind))?,
        None => config.server.addr()?,
    };

    tracing::info!(
        dry_run = dry_run,
        publish_at = %config.schedule.publish_at,
        input = %config.general.input_path.display(),
        content_dir = %config.general.content_dir.display(),
        "Starting phrasecast"
    );

    let pipeline = build_pipeline(&config, dry_run).await?;

    if config.schedule.generate_on_startup && !args.no_generate {
        // Failures are logged by the pipeline; the process keeps serving.
        if let Ok(report) = pipeline.generate_all().await {
            tracing::info!(
                generated = report.generated,
                skipped = report.skipped,
                failed = report.failed(),
                "Startup generation complete"
            );
        }
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let http = tokio::spawn(server::serve(listener, Arc::clone(&pipeline), async move {
        let _ = stop_rx.changed().await;
    }));

    let clock = Arc::new(SystemClock);
    let sleeper = Arc::new(TokioSleeper::new(Arc::clone(&clock)));
    tracing::info!(
        next = %schedule.next_after(time::OffsetDateTime::now_utc()),
        "Scheduler started"
    );

    // Set up graceful shutdown
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    let cycles = run_schedule(schedule.ticks(clock, sleeper), shutdown, |_tick| {
        let pipeline = Arc::clone(&pipeline);
        async move {
            // Outcomes are logged and kept for the status endpoint.
            let _ = pipeline.publish_next().await;
        }
    })
    .await;

    let _ = stop_tx.send(true);
    http.await
        .context("HTTP server task failed")?
        .context("HTTP server error")?;

    tracing::info!(cycles = cycles, "phrasecast stopped");
    Ok(())
}
