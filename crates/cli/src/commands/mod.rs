//! Command implementations

pub mod config;
pub mod doctor;
pub mod generate;
pub mod ledger;
pub mod publish;
pub mod serve;
pub mod status;

use anyhow::{Context, Result, bail};
use phrasecast_adapters::{
    instagram::{InstagramConfig, InstagramCredentials, InstagramPublisher, StubPublisher},
    ledger::SqliteLedger,
    phrases::CsvPhraseSource,
    render::{RasterAssets, RasterBackend},
    store::FsArtifactStore,
};
use phrasecast_domain::{
    ArtifactStore, Clock, PhraseSource, PublicationLedger, Publisher, RenderBackend, SystemClock,
    usecases::{Pipeline, PipelineConfig, PublishConfig},
};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

/// The pipeline as wired by the binary
pub type AppPipeline = Pipeline<
    dyn PhraseSource,
    dyn RenderBackend,
    dyn ArtifactStore,
    dyn PublicationLedger,
    dyn Publisher,
    dyn Clock,
>;

/// Wire every adapter from configuration
pub async fn build_pipeline(config: &AppConfig, dry_run: bool) -> Result<Arc<AppPipeline>> {
    let source: Arc<dyn PhraseSource> = Arc::new(CsvPhraseSource::new(&config.general.input_path));

    let backend: Arc<dyn RenderBackend> = Arc::new(build_backend(config));

    let store: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(&config.general.content_dir));

    let ledger: Arc<dyn PublicationLedger> = Arc::new(
        SqliteLedger::new(&config.general.state_db_path)
            .await
            .context("Failed to open publication ledger")?,
    );

    let publisher = build_publisher(config)?;
    if !publisher.is_enabled() && !dry_run {
        tracing::warn!(
            username_env = %config.instagram.username_env,
            password_env = %config.instagram.password_env,
            "Instagram credentials not configured; publication cycles will fail until they are set"
        );
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let pipeline_config = PipelineConfig {
        template: config.template.layout.clone(),
        publish: PublishConfig {
            caption: config.schedule.caption.clone(),
            timeout: Duration::from_secs(config.schedule.publish_timeout_secs),
            dry_run,
        },
    };

    Ok(Arc::new(Pipeline::new(
        source,
        backend,
        store,
        ledger,
        publisher,
        clock,
        pipeline_config,
    )))
}

/// Raster backend with the configured font and logo
pub(crate) fn build_backend(config: &AppConfig) -> RasterBackend {
    RasterBackend::new(&RasterAssets {
        font_path: config.template.font_path.clone(),
        logo_path: config.template.logo_path.clone(),
        logo_max_width: config.template.layout.logo_max_width,
    })
}

fn build_publisher(config: &AppConfig) -> Result<Arc<dyn Publisher>> {
    match config.instagram.publisher.trim() {
        "instagram" => {
            let publisher = InstagramPublisher::new(
                load_credentials(config),
                InstagramConfig {
                    base_url: config.instagram.base_url.clone(),
                    timeout: Duration::from_secs(config.instagram.timeout_secs),
                    ..Default::default()
                },
            )
            .context("Failed to build Instagram publisher")?;
            Ok(Arc::new(publisher))
        }
        "stub" => Ok(Arc::new(StubPublisher::new(true))),
        other => bail!("Unknown publisher: {}", other),
    }
}

/// Credentials from the configured env vars, `None` if either is unset or empty
pub(crate) fn load_credentials(config: &AppConfig) -> Option<InstagramCredentials> {
    let username = load_env(&config.instagram.username_env)?;
    let password = load_env(&config.instagram.password_env)?;

    Some(InstagramCredentials {
        username,
        password: SecretString::new(password.into()),
    })
}

fn load_env(env_var: &str) -> Option<String> {
    if env_var.trim().is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
