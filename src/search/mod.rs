//! Search Façade: semantic search with an optional RAG answer.

pub mod gate;

use std::sync::Arc;

use crate::api::schema::SearchRequest;
use crate::api::{ApiClient, ClientError, Operation, Result, SearchResponse};

pub use gate::{Gated, LatestWins};

/// Per-call knobs; `None` falls back to the configured defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub top_k: Option<usize>,
    pub use_rag: Option<bool>,
}

pub struct SearchFacade {
    api: Arc<ApiClient>,
    default_top_k: usize,
    default_use_rag: bool,
}

impl SearchFacade {
    pub fn new(api: Arc<ApiClient>, default_top_k: usize, default_use_rag: bool) -> Self {
        Self {
            api,
            default_top_k,
            default_use_rag,
        }
    }

    /// Run one search. A blank query is rejected before any request; an
    /// empty result list is a normal response.
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::validation("Please enter a search query"));
        }
        let top_k = options.top_k.unwrap_or(self.default_top_k);
        if top_k == 0 {
            return Err(ClientError::validation("top_k must be at least 1"));
        }
        let use_rag = options.use_rag.unwrap_or(self.default_use_rag);

        tracing::info!(query, top_k, use_rag, "Searching");
        let response: SearchResponse = self
            .api
            .post_json(
                Operation::Search,
                "/search",
                &SearchRequest {
                    query,
                    top_k,
                    use_rag,
                },
            )
            .await?;
        tracing::debug!(
            results = response.results.len(),
            processing_time = response.processing_time,
            "Search finished"
        );
        Ok(response)
    }

    /// Like [`search`](Self::search), but cancels any earlier search still
    /// running through the same gate.
    pub async fn search_latest(
        &self,
        gate: &LatestWins,
        query: &str,
        options: SearchOptions,
    ) -> Gated<Result<SearchResponse>> {
        gate.run(self.search(query, options)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facade() -> SearchFacade {
        // Nothing listens on the discard port; any request would fail as transport.
        let api = Arc::new(ApiClient::new("http://127.0.0.1:9", None).unwrap());
        SearchFacade::new(api, 5, true)
    }

    #[tokio::test]
    async fn blank_query_is_a_validation_error() {
        for query in ["", "   ", "\n\t"] {
            let err = facade()
                .search(query, SearchOptions::default())
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{query:?} gave {err:?}");
            assert_eq!(err.to_string(), "Please enter a search query");
        }
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let err = facade()
            .search(
                "revenue",
                SearchOptions {
                    top_k: Some(0),
                    use_rag: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
