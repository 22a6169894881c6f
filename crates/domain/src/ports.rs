//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{ArtifactRef, ImageArtifact, ImageLayout, MediaPost, PhraseEntry, PublishedRecord};

/// Error type for phrase source operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Phrase source not found: {0}")]
    NotFound(String),
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },
}

/// Port for reading phrase rows
#[async_trait]
pub trait PhraseSource: Send + Sync {
    /// Load every row, in input order
    async fn load(&self) -> Result<Vec<PhraseEntry>, SourceError>;
}

/// Error type for render backends
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render backend error: {0}")]
    Backend(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Port for the text layout / raster backend
pub trait RenderBackend: Send + Sync {
    /// Width in pixels of `text` drawn at `size` pixels
    fn measure_text_width(&self, text: &str, size: f32) -> f32;

    /// Draw a laid-out image and return the encoded bytes
    fn render(&self, layout: &ImageLayout) -> Result<Vec<u8>, RenderError>;
}

/// Error type for artifact store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot prepare content directory {path}: {message}")]
    Directory { path: String, message: String },
    #[error("Failed to write {name}: {message}")]
    Write { name: String, message: String },
    #[error("Failed to read {name}: {message}")]
    Read { name: String, message: String },
    #[error("Failed to list artifacts: {0}")]
    List(String),
}

/// Port for persisting rendered artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Make sure the storage location exists
    async fn prepare(&self) -> Result<(), StoreError>;

    /// Persist an artifact, replacing any artifact with the same name
    async fn persist(&self, artifact: &ImageArtifact) -> Result<ArtifactRef, StoreError>;

    /// All persisted artifacts in publication order
    async fn list_all(&self) -> Result<Vec<ArtifactRef>, StoreError>;

    /// Read the bytes of a persisted artifact
    async fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, StoreError>;
}

/// Error type for publisher operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Credentials are not configured")]
    CredentialsMissing,
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Result of a successful publish operation
#[derive(Debug, Clone)]
pub struct PublishResult {
    /// Platform-specific media ID
    pub id: String,
    /// URL to the published content, if available
    pub url: Option<String>,
}

/// Port for publishing an image with a caption
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a post, returns the remote ID
    async fn publish(&self, post: &MediaPost) -> Result<PublishResult, PublishError>;

    /// Whether credentials are configured
    fn is_enabled(&self) -> bool;

    /// Get the platform name (e.g., "instagram")
    fn platform(&self) -> &'static str;
}

/// Error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the durable record of published artifacts
#[async_trait]
pub trait PublicationLedger: Send + Sync {
    /// Whether an artifact has been published
    async fn is_published(&self, artifact_name: &str) -> Result<bool, LedgerError>;

    /// Record a confirmed publish
    async fn record_published(&self, record: &PublishedRecord) -> Result<(), LedgerError>;

    /// All records, oldest first
    async fn list(&self) -> Result<Vec<PublishedRecord>, LedgerError>;

    /// Forget every record, returns how many were removed
    async fn reset(&self) -> Result<u64, LedgerError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
