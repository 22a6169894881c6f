//! Instagram publishing adapters

mod client;

pub use client::{InstagramConfig, InstagramCredentials, InstagramPublisher};

use async_trait::async_trait;
use phrasecast_domain::{MediaPost, PublishError, PublishResult, Publisher};
use std::sync::Mutex;

/// Publisher that records posts instead of sending them
pub struct StubPublisher {
    enabled: bool,
    published: Mutex<Vec<MediaPost>>,
}

impl StubPublisher {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            published: Mutex::new(vec![]),
        }
    }

    /// All posts that were "published", oldest first
    pub fn get_published(&self) -> Vec<MediaPost> {
        self.published
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, post: &MediaPost) -> Result<PublishResult, PublishError> {
        if !self.enabled {
            return Err(PublishError::CredentialsMissing);
        }

        self.published
            .lock()
            .map_err(|e| PublishError::Api(e.to_string()))?
            .push(post.clone());

        let id = format!("stub_{}", post.artifact_name);
        Ok(PublishResult {
            url: Some(format!("https://www.instagram.com/p/{}/", id)),
            id,
        })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn platform(&self) -> &'static str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(name: &str) -> MediaPost {
        MediaPost {
            artifact_name: name.to_string(),
            image: vec![1, 2, 3],
            caption: "hola".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stub_records_posts() {
        let publisher = StubPublisher::new(true);

        let result = publisher.publish(&post("0001_A.jpg")).await.unwrap();

        assert_eq!(result.id, "stub_0001_A.jpg");
        assert_eq!(publisher.get_published().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_stub_reports_missing_credentials() {
        let publisher = StubPublisher::new(false);

        assert!(!publisher.is_enabled());
        assert!(matches!(
            publisher.publish(&post("0001_A.jpg")).await,
            Err(PublishError::CredentialsMissing)
        ));
        assert!(publisher.get_published().is_empty());
    }
}
