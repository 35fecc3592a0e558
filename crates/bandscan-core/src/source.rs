//! The adapter seam between the directory model and remote services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::node::{Node, SourceId};
use crate::sources::{somafm::SomaFm, tunein::TuneIn};

/// One remote directory service.
///
/// Implementations own their URL-building and page-parsing logic and must
/// be idempotent: listing the same category twice against an unchanged
/// upstream yields structurally identical node lists (same ids, same
/// order). Adapters never cache; that is the cache layer's job.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    fn id(&self) -> SourceId;

    /// Display name for the service's synthetic root (e.g. "TuneIn").
    fn display_name(&self) -> &'static str;

    /// Category id of the service's root listing.
    fn root_category(&self) -> String;

    /// Fetch and parse one category page into its direct children.
    async fn list_category(&self, category_id: &str) -> Result<Vec<Node>>;
}

/// The set of enabled directory services, keyed by [`SourceId`].
pub struct SourceSet {
    sources: Vec<Arc<dyn DirectorySource>>,
}

impl SourceSet {
    pub fn new(sources: Vec<Arc<dyn DirectorySource>>) -> Self {
        Self { sources }
    }

    /// Build adapters for every service enabled in the config, sharing one
    /// HTTP client.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut sources: Vec<Arc<dyn DirectorySource>> = Vec::new();
        if config.sources.tunein.enabled {
            sources.push(Arc::new(TuneIn::new(
                client.clone(),
                config.sources.tunein.base_url.clone(),
            )));
        }
        if config.sources.somafm.enabled {
            sources.push(Arc::new(SomaFm::new(
                client.clone(),
                config.sources.somafm.base_url.clone(),
            )));
        }
        Self { sources }
    }

    pub fn get(&self, id: SourceId) -> Option<&Arc<dyn DirectorySource>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DirectorySource>> {
        self.sources.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Shared HTTP client for adapters and the playlist resolver.
pub fn build_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.fetch.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.fetch.connect_timeout_secs))
        .timeout(Duration::from_secs(config.fetch.timeout_secs))
        .build()
}

/// One GET, body as text. All transport failures map to `Fetch`.
pub(crate) async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| crate::error::DirectoryError::fetch(url, e))?
        .error_for_status()
        .map_err(|e| crate::error::DirectoryError::fetch(url, e))?;
    resp.text()
        .await
        .map_err(|e| crate::error::DirectoryError::fetch(url, e))
}
