//! Publication use case - publishes the next pending artifact and records it

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{ArtifactRef, MediaPost, PublishReport, PublishedRecord};
use crate::ports::{
    ArtifactStore, Clock, LedgerError, PublicationLedger, PublishError, Publisher, StoreError,
};
use crate::usecases::select::{PublicationSelector, SelectError};

/// Caption with `{index}`, `{name}` and `{date}` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptionTemplate(String);

impl CaptionTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, artifact: &ArtifactRef, now: OffsetDateTime) -> String {
        let index = artifact
            .sequence_index
            .map(|i| i.to_string())
            .unwrap_or_default();
        self.0
            .replace("{index}", &index)
            .replace("{name}", &artifact.name)
            .replace("{date}", &now.date().to_string())
    }
}

impl Default for CaptionTemplate {
    fn default() -> Self {
        Self::new("Frase del día #{index}")
    }
}

/// Configuration for publication cycles
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub caption: CaptionTemplate,
    /// Upper bound for a single publish call
    pub timeout: Duration,
    /// Select and log, but never publish or record
    pub dry_run: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            caption: CaptionTemplate::default(),
            timeout: Duration::from_secs(60),
            dry_run: false,
        }
    }
}

/// Errors from a publication cycle
#[derive(Debug, thiserror::Error)]
pub enum PublishCycleError {
    #[error("No pending artifacts to publish")]
    NoPendingArtifacts,
    #[error("Publishing {artifact} failed: {source}")]
    Publish {
        artifact: String,
        #[source]
        source: PublishError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl PublishCycleError {
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Self::Publish { artifact, .. } => Some(artifact),
            _ => None,
        }
    }
}

impl From<SelectError> for PublishCycleError {
    fn from(error: SelectError) -> Self {
        match error {
            SelectError::NoPendingArtifacts => Self::NoPendingArtifacts,
            SelectError::Store(e) => Self::Store(e),
            SelectError::Ledger(e) => Self::Ledger(e),
        }
    }
}

/// One select → publish → record cycle
pub struct PublishCycle<'a, A, L, P, Cl>
where
    A: ArtifactStore + ?Sized,
    L: PublicationLedger + ?Sized,
    P: Publisher + ?Sized,
    Cl: Clock + ?Sized,
{
    store: &'a A,
    ledger: &'a L,
    publisher: &'a P,
    clock: &'a Cl,
    config: &'a PublishConfig,
}

impl<'a, A, L, P, Cl> PublishCycle<'a, A, L, P, Cl>
where
    A: ArtifactStore + ?Sized,
    L: PublicationLedger + ?Sized,
    P: Publisher + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        store: &'a A,
        ledger: &'a L,
        publisher: &'a P,
        clock: &'a Cl,
        config: &'a PublishConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            publisher,
            clock,
            config,
        }
    }

    /// Run the whole cycle. The ledger changes only after a confirmed publish.
    pub async fn run(&self) -> Result<PublishReport, PublishCycleError> {
        let (artifact, image) = self.select().await?;
        self.deliver(artifact, image).await
    }

    /// Pick the next artifact and load its bytes
    pub async fn select(&self) -> Result<(ArtifactRef, Vec<u8>), PublishCycleError> {
        let artifact = PublicationSelector::new(self.store, self.ledger)
            .next_artifact()
            .await?;
        let image = self.store.read(&artifact).await?;
        Ok((artifact, image))
    }

    /// Publish an already selected artifact and record it on success
    pub async fn deliver(
        &self,
        artifact: ArtifactRef,
        image: Vec<u8>,
    ) -> Result<PublishReport, PublishCycleError> {
        let caption = self.config.caption.render(&artifact, self.clock.now());

        if self.config.dry_run {
            tracing::info!(
                artifact = %artifact,
                caption = %caption,
                bytes = image.len(),
                "[DRY RUN] Would publish"
            );
            return Ok(PublishReport {
                artifact,
                caption,
                remote_id: None,
                remote_url: None,
                dry_run: true,
            });
        }

        if !self.publisher.is_enabled() {
            tracing::warn!(
                artifact = %artifact,
                platform = self.publisher.platform(),
                "Publishing skipped: credentials are not configured"
            );
            return Err(PublishCycleError::Publish {
                artifact: artifact.name,
                source: PublishError::CredentialsMissing,
            });
        }

        let content_hash = format!("{:x}", Sha256::digest(&image));
        let post = MediaPost {
            artifact_name: artifact.name.clone(),
            image,
            caption: caption.clone(),
        };

        let result = match tokio::time::timeout(self.config.timeout, self.publisher.publish(&post))
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                return Err(PublishCycleError::Publish {
                    artifact: artifact.name,
                    source: e,
                });
            }
            Err(_) => {
                return Err(PublishCycleError::Publish {
                    artifact: artifact.name,
                    source: PublishError::Timeout(self.config.timeout),
                });
            }
        };

        tracing::info!(
            artifact = %artifact,
            platform = self.publisher.platform(),
            remote_id = %result.id,
            url = ?result.url,
            "Published artifact"
        );

        let record = PublishedRecord {
            id: Uuid::new_v4(),
            artifact_name: artifact.name.clone(),
            sequence_index: artifact.sequence_index,
            content_hash,
            remote_id: result.id.clone(),
            remote_url: result.url.clone(),
            caption: caption.clone(),
            published_at: self.clock.now(),
        };

        if let Err(e) = self.ledger.record_published(&record).await {
            tracing::error!(
                artifact = %artifact,
                error = %e,
                "Published but failed to record; artifact will be selected again"
            );
            return Err(e.into());
        }

        Ok(PublishReport {
            artifact,
            caption,
            remote_id: Some(result.id),
            remote_url: result.url,
            dry_run: false,
        })
    }
}
