//! Sources, prompts and styles.

use super::{endpoints, or_empty};
use crate::client::TtkiaClient;
use crate::error::Result;
use crate::types::{Catalog, Source};

/// Catalog API client.
pub struct CatalogApi {
    client: TtkiaClient,
}

impl CatalogApi {
    pub(crate) fn new(client: TtkiaClient) -> Self {
        Self { client }
    }

    /// List knowledge-base sources.
    ///
    /// A body that is not a JSON array yields an empty list.
    pub async fn try_sources(&self) -> Result<Vec<Source>> {
        let body: serde_json::Value = self.client.post_read_empty(endpoints::SOURCES).await?;
        if !body.is_array() {
            tracing::warn!("Unexpected format in sources response");
            return Ok(Vec::new());
        }
        let sources: Vec<Source> = serde_json::from_value(body)?;
        tracing::info!(count = sources.len(), "Fetched sources");
        Ok(sources)
    }

    /// List knowledge-base sources, or an empty list on failure.
    pub async fn sources(&self) -> Vec<Source> {
        or_empty(self.try_sources().await, "sources")
    }

    /// Non-empty titles of every source, or an empty list on failure.
    pub async fn source_titles(&self) -> Vec<String> {
        self.sources()
            .await
            .into_iter()
            .filter_map(|s| s.title.filter(|t| !t.is_empty()))
            .collect()
    }

    /// List prompt templates.
    pub async fn try_prompts(&self) -> Result<Catalog> {
        let prompts: Catalog = self.client.get(endpoints::PROMPTS).await?;
        tracing::info!(count = prompts.len(), "Fetched prompts");
        Ok(prompts)
    }

    /// List prompt templates, or an empty map on failure.
    pub async fn prompts(&self) -> Catalog {
        or_empty(self.try_prompts().await, "prompts")
    }

    /// List response styles.
    pub async fn try_styles(&self) -> Result<Catalog> {
        let styles: Catalog = self.client.get(endpoints::STYLES).await?;
        tracing::info!(count = styles.len(), "Fetched styles");
        Ok(styles)
    }

    /// List response styles, or an empty map on failure.
    pub async fn styles(&self) -> Catalog {
        or_empty(self.try_styles().await, "styles")
    }
}
