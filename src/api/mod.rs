//! Backend API: transport, wire schema and error taxonomy.
//!
//! The search backend is an external service; this module only knows its
//! HTTP contract.

pub mod client;
pub mod error;
pub mod schema;

pub use client::ApiClient;
pub use error::{ClientError, Operation, Result};
pub use schema::{
    AnalyticsStats, DocumentRecord, HealthResponse, SearchHit, SearchResponse, ServerInfo,
    UserProfile,
};

/// Liveness probe; needs no session.
pub async fn health(api: &ApiClient) -> Result<HealthResponse> {
    api.get_json(Operation::Health, "/health").await
}

pub async fn info(api: &ApiClient) -> Result<ServerInfo> {
    api.get_json(Operation::Info, "/info").await
}

pub async fn stats(api: &ApiClient) -> Result<AnalyticsStats> {
    api.get_json(Operation::Stats, "/analytics/stats").await
}
