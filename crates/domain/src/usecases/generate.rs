//! Generation use case - phrase rows to persisted image artifacts

use crate::model::GenerationReport;
use crate::ports::{ArtifactStore, PhraseSource, RenderBackend, SourceError, StoreError};
use crate::usecases::render::{ImageRenderer, Template};

/// Errors that abort a whole generation run
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    StoreDirectory(StoreError),
}

/// Runs the source → render → store batch
pub struct GenerateUseCase<'a, S, B, A>
where
    S: PhraseSource + ?Sized,
    B: RenderBackend + ?Sized,
    A: ArtifactStore + ?Sized,
{
    source: &'a S,
    renderer: ImageRenderer<'a, B>,
    store: &'a A,
}

impl<'a, S, B, A> GenerateUseCase<'a, S, B, A>
where
    S: PhraseSource + ?Sized,
    B: RenderBackend + ?Sized,
    A: ArtifactStore + ?Sized,
{
    pub fn new(source: &'a S, backend: &'a B, store: &'a A, template: Template) -> Self {
        Self {
            source,
            renderer: ImageRenderer::new(backend, template),
            store,
        }
    }

    /// Render and persist every non-blank row.
    ///
    /// Each row keeps its 1-based source position as its index, so skipped
    /// rows leave gaps. Per-row render and write failures are counted and
    /// logged; only a missing source or an unusable content directory fails
    /// the run.
    pub async fn run(&self) -> Result<GenerationReport, GenerateError> {
        let entries = self.source.load().await?;

        tracing::info!(entries = entries.len(), "Loaded phrases");

        self.store
            .prepare()
            .await
            .map_err(GenerateError::StoreDirectory)?;

        let mut report = GenerationReport {
            entries: entries.len(),
            ..Default::default()
        };

        for (position, entry) in entries.iter().enumerate() {
            let sequence_index = position as u32 + 1;

            let artifact = match self.renderer.render(entry, sequence_index) {
                Ok(Some(artifact)) => artifact,
                Ok(None) => {
                    tracing::debug!(sequence_index, "Skipping blank phrase");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(sequence_index, error = %e, "Failed to render phrase");
                    report.render_failed += 1;
                    continue;
                }
            };

            match self.store.persist(&artifact).await {
                Ok(stored) => {
                    tracing::debug!(artifact = %stored, "Stored artifact");
                    report.generated += 1;
                    report.artifacts.push(stored);
                }
                Err(e) => {
                    tracing::warn!(sequence_index, error = %e, "Failed to store artifact");
                    report.store_failed += 1;
                }
            }
        }

        tracing::info!(
            entries = report.entries,
            generated = report.generated,
            skipped = report.skipped,
            failed = report.failed(),
            "Generation complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{ArtifactRef, ImageArtifact, PhraseEntry};
    use crate::usecases::render::tests::FakeBackend;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    pub(crate) struct FakeSource {
        pub entries: Option<Vec<PhraseEntry>>,
    }

    #[async_trait]
    impl PhraseSource for FakeSource {
        async fn load(&self) -> Result<Vec<PhraseEntry>, SourceError> {
            self.entries
                .clone()
                .ok_or_else(|| SourceError::NotFound("frases.csv".to_string()))
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub files: Mutex<BTreeMap<String, Vec<u8>>>,
        pub broken_dir: bool,
        pub reject: Option<String>,
    }

    impl FakeStore {
        pub(crate) fn with_names(names: &[&str]) -> Self {
            let files = names
                .iter()
                .map(|n| (n.to_string(), n.as_bytes().to_vec()))
                .collect();
            Self {
                files: Mutex::new(files),
                ..Default::default()
            }
        }

        pub(crate) fn names(&self) -> Vec<String> {
            self.files.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl ArtifactStore for FakeStore {
        async fn prepare(&self) -> Result<(), StoreError> {
            if self.broken_dir {
                return Err(StoreError::Directory {
                    path: "content".to_string(),
                    message: "read-only".to_string(),
                });
            }
            Ok(())
        }

        async fn persist(&self, artifact: &ImageArtifact) -> Result<ArtifactRef, StoreError> {
            let name = artifact.file_name();
            if self.reject.as_deref().is_some_and(|r| name.contains(r)) {
                return Err(StoreError::Write {
                    name,
                    message: "disk full".to_string(),
                });
            }
            self.files
                .lock()
                .unwrap()
                .insert(name.clone(), artifact.bytes.clone());
            Ok(ArtifactRef::from_name(name))
        }

        async fn list_all(&self) -> Result<Vec<ArtifactRef>, StoreError> {
            let mut refs: Vec<_> = self
                .files
                .lock()
                .unwrap()
                .keys()
                .map(|n| ArtifactRef::from_name(n.clone()))
                .collect();
            refs.sort();
            Ok(refs)
        }

        async fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, StoreError> {
            self.files
                .lock()
                .unwrap()
                .get(&artifact.name)
                .cloned()
                .ok_or_else(|| StoreError::Read {
                    name: artifact.name.clone(),
                    message: "missing".to_string(),
                })
        }
    }

    fn rows(texts: &[&str]) -> Option<Vec<PhraseEntry>> {
        Some(texts.iter().map(|t| PhraseEntry::new(*t)).collect())
    }

    #[tokio::test]
    async fn test_blank_rows_keep_their_index() {
        let source = FakeSource {
            entries: rows(&["primera", "", "tercera"]),
        };
        let backend = FakeBackend::default();
        let store = FakeStore::default();

        let usecase = GenerateUseCase::new(&source, &backend, &store, Template::default());
        let report = usecase.run().await.unwrap();

        assert_eq!(report.entries, 3);
        assert_eq!(report.generated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.names(), vec!["0001_PRIMERA.jpg", "0003_TERCERA.jpg"]);

        let indices: Vec<_> = report.artifacts.iter().map(|a| a.sequence_index).collect();
        assert_eq!(indices, vec![Some(1), Some(3)]);
    }

    #[tokio::test]
    async fn test_whitespace_rows_are_skipped() {
        let source = FakeSource {
            entries: rows(&["  ", "\t"]),
        };
        let backend = FakeBackend::default();
        let store = FakeStore::default();

        let report = GenerateUseCase::new(&source, &backend, &store, Template::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.generated, 0);
        assert_eq!(report.skipped, 2);
        assert!(store.names().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let source = FakeSource { entries: None };
        let backend = FakeBackend::default();
        let store = FakeStore::default();

        let result = GenerateUseCase::new(&source, &backend, &store, Template::default())
            .run()
            .await;

        assert!(matches!(
            result,
            Err(GenerateError::Source(SourceError::NotFound(_)))
        ));
        assert!(backend.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_directory_failure_is_fatal() {
        let source = FakeSource {
            entries: rows(&["hola"]),
        };
        let backend = FakeBackend::default();
        let store = FakeStore {
            broken_dir: true,
            ..Default::default()
        };

        let result = GenerateUseCase::new(&source, &backend, &store, Template::default())
            .run()
            .await;

        assert!(matches!(result, Err(GenerateError::StoreDirectory(_))));
    }

    #[tokio::test]
    async fn test_per_entry_failures_do_not_abort_batch() {
        let source = FakeSource {
            entries: rows(&["uno", "boom", "tres", "cuatro"]),
        };
        let backend = FakeBackend {
            fail_on: Some("BOOM".to_string()),
            ..Default::default()
        };
        let store = FakeStore {
            reject: Some("TRES".to_string()),
            ..Default::default()
        };

        let report = GenerateUseCase::new(&source, &backend, &store, Template::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.generated, 2);
        assert_eq!(report.render_failed, 1);
        assert_eq!(report.store_failed, 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(store.names(), vec!["0001_UNO.jpg", "0004_CUATRO.jpg"]);
    }

    #[tokio::test]
    async fn test_regeneration_is_idempotent() {
        let source = FakeSource {
            entries: rows(&["uno", "dos"]),
        };
        let backend = FakeBackend::default();
        let store = FakeStore::default();
        let usecase = GenerateUseCase::new(&source, &backend, &store, Template::default());

        usecase.run().await.unwrap();
        let first = store.files.lock().unwrap().clone();
        usecase.run().await.unwrap();
        let second = store.files.lock().unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }
}
