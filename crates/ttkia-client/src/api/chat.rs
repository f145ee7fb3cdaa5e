//! Query API.

use super::endpoints;
use crate::client::TtkiaClient;
use crate::error::{Result, truncate};
use crate::types::{QueryPayload, QueryRequest, QueryResponse};

/// Query API client.
pub struct ChatApi {
    client: TtkiaClient,
}

impl ChatApi {
    pub(crate) fn new(client: TtkiaClient) -> Self {
        Self { client }
    }

    /// Submit a query and wait for the complete answer.
    ///
    /// When `request.sources` is `None` the source listing is fetched first
    /// and every titled source is used; a failed listing means no sources.
    /// The query itself is never retried.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let sources = match &request.sources {
            Some(sources) => sources.clone(),
            None => {
                tracing::debug!("Fetching sources for query");
                let titles = self.client.catalog().source_titles().await;
                tracing::debug!(count = titles.len(), "Using all available sources");
                titles
            }
        };

        let payload = QueryPayload::new(&request, &sources);

        tracing::info!(query = %truncate(&request.query, 50), "Running query");
        tracing::debug!(
            conversation_id = request.conversation_id.as_deref(),
            prompt = %request.prompt,
            style = %request.style,
            teacher_mode = request.teacher_mode,
            web_search = request.web_search,
            sources = sources.len(),
            "Query parameters"
        );

        let response: QueryResponse = self
            .client
            .post(endpoints::QUERY, &payload)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Query failed"))?;

        tracing::info!(
            message_id = response.message_id.as_deref(),
            "Query completed"
        );
        Ok(response)
    }

    /// Submit a plain-text query with default settings.
    pub async fn ask(&self, text: impl Into<String>) -> Result<QueryResponse> {
        self.query(QueryRequest::new(text)).await
    }
}
