//! Pipeline - owns the ports and serializes access to the store and the ledger

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::model::{GenerationReport, PipelineStatus, PublishAttempt, PublishReport};
use crate::ports::{
    ArtifactStore, Clock, LedgerError, PhraseSource, PublicationLedger, Publisher, RenderBackend,
};
use crate::usecases::generate::{GenerateError, GenerateUseCase};
use crate::usecases::publish::{PublishConfig, PublishCycle, PublishCycleError};
use crate::usecases::render::Template;
use crate::usecases::select::{PublicationSelector, SelectError};

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub template: Template,
    pub publish: PublishConfig,
}

/// Generation and publication over one content directory and one account.
///
/// Generation holds the store lock exclusively. A publication cycle holds
/// the ledger lock for its whole select → publish → record sequence and
/// takes the store lock shared only while it lists and reads artifacts.
pub struct Pipeline<S, B, A, L, P, Cl>
where
    S: PhraseSource + ?Sized,
    B: RenderBackend + ?Sized,
    A: ArtifactStore + ?Sized,
    L: PublicationLedger + ?Sized,
    P: Publisher + ?Sized,
    Cl: Clock + ?Sized,
{
    source: Arc<S>,
    backend: Arc<B>,
    store: Arc<A>,
    ledger: Arc<L>,
    publisher: Arc<P>,
    clock: Arc<Cl>,
    config: PipelineConfig,
    store_lock: RwLock<()>,
    ledger_lock: Mutex<()>,
    last_generation: RwLock<Option<GenerationReport>>,
    last_publish: RwLock<Option<PublishAttempt>>,
}

impl<S, B, A, L, P, Cl> Pipeline<S, B, A, L, P, Cl>
where
    S: PhraseSource + ?Sized,
    B: RenderBackend + ?Sized,
    A: ArtifactStore + ?Sized,
    L: PublicationLedger + ?Sized,
    P: Publisher + ?Sized,
    Cl: Clock + ?Sized,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<S>,
        backend: Arc<B>,
        store: Arc<A>,
        ledger: Arc<L>,
        publisher: Arc<P>,
        clock: Arc<Cl>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            backend,
            store,
            ledger,
            publisher,
            clock,
            config,
            store_lock: RwLock::new(()),
            ledger_lock: Mutex::new(()),
            last_generation: RwLock::new(None),
            last_publish: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn credentials_configured(&self) -> bool {
        self.publisher.is_enabled()
    }

    /// Run one generation cycle
    pub async fn generate_all(&self) -> Result<GenerationReport, GenerateError> {
        let _store = self.store_lock.write().await;

        let usecase = GenerateUseCase::new(
            self.source.as_ref(),
            self.backend.as_ref(),
            self.store.as_ref(),
            self.config.template.clone(),
        );

        match usecase.run().await {
            Ok(report) => {
                *self.last_generation.write().await = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Generation cycle failed");
                Err(e)
            }
        }
    }

    /// Run one publication cycle
    pub async fn publish_next(&self) -> Result<PublishReport, PublishCycleError> {
        let _ledger = self.ledger_lock.lock().await;

        let cycle = PublishCycle::new(
            self.store.as_ref(),
            self.ledger.as_ref(),
            self.publisher.as_ref(),
            self.clock.as_ref(),
            &self.config.publish,
        );

        let result = async {
            let (artifact, image) = {
                let _store = self.store_lock.read().await;
                cycle.select().await?
            };
            cycle.deliver(artifact, image).await
        }
        .await;

        let attempt = match &result {
            Ok(report) => PublishAttempt {
                attempted_at: self.clock.now(),
                artifact: Some(report.artifact.name.clone()),
                success: true,
                message: if report.dry_run {
                    "dry run".to_string()
                } else {
                    "published".to_string()
                },
            },
            Err(e) => {
                match e {
                    PublishCycleError::NoPendingArtifacts => {
                        tracing::info!("Nothing to publish: every artifact has been published")
                    }
                    other => tracing::error!(error = %other, "Publication cycle failed"),
                }
                PublishAttempt {
                    attempted_at: self.clock.now(),
                    artifact: e.artifact().map(String::from),
                    success: false,
                    message: e.to_string(),
                }
            }
        };
        *self.last_publish.write().await = Some(attempt);

        result
    }

    /// Current counts and last cycle outcomes
    pub async fn status(&self) -> Result<PipelineStatus, SelectError> {
        let (published, pending) = {
            let _store = self.store_lock.read().await;
            PublicationSelector::new(self.store.as_ref(), self.ledger.as_ref())
                .partition()
                .await?
        };

        Ok(PipelineStatus {
            images_generated: published.len() + pending.len(),
            images_published: published.len(),
            images_pending: pending.len(),
            credentials_configured: self.credentials_configured(),
            next_artifact: pending.first().map(|a| a.name.clone()),
            last_generation: self.last_generation.read().await.clone(),
            last_publish: self.last_publish.read().await.clone(),
        })
    }

    /// Forget every published record so publication starts over
    pub async fn reset_ledger(&self) -> Result<u64, LedgerError> {
        let _ledger = self.ledger_lock.lock().await;
        let removed = self.ledger.reset().await?;
        tracing::warn!(removed, "Publication ledger reset");
        Ok(removed)
    }
}
