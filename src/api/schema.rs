use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Profile returned by the auth endpoints and persisted with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl UserProfile {
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("")
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    pub user: UserProfile,
}

fn bearer() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub chunks_created: u64,
    #[serde(default)]
    pub processing_time: f64,
}

/// One entry of `GET /documents`. Every field is optional on the wire; the
/// accessors supply the display defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Older backends exposed the raw Mongo key instead of `document_id`.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl DocumentRecord {
    pub fn id(&self) -> Option<&str> {
        self.document_id
            .as_deref()
            .or(self.legacy_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn name(&self) -> &str {
        self.file_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown")
    }

    pub fn chunks(&self) -> u64 {
        self.total_chunks.unwrap_or(0)
    }

    pub fn uploaded_at(&self) -> Option<NaiveDateTime> {
        self.upload_date.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub chunks_deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub top_k: usize,
    pub use_rag: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub content: String,
    #[serde(default = "unknown_file")]
    pub file_name: String,
    #[serde(default)]
    pub chunk_id: i64,
    #[serde(default)]
    pub similarity_score: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

fn unknown_file() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub rag_answer: Option<String>,
    #[serde(default)]
    pub total_results: usize,
    #[serde(default)]
    pub processing_time: f64,
}

impl SearchResponse {
    /// The synthesized answer, ignoring blank strings.
    pub fn answer(&self) -> Option<&str> {
        self.rag_answer.as_deref().filter(|a| !a.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub database_connected: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub embedding_dimensions: Option<u64>,
    #[serde(default)]
    pub chunk_size: Option<u64>,
    #[serde(default)]
    pub chunk_overlap: Option<u64>,
    #[serde(default)]
    pub max_file_size_mb: Option<f64>,
    #[serde(default)]
    pub supported_formats: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsStats {
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub total_searches: u64,
    /// Bucket shape is backend-defined; only the count of buckets is shown.
    #[serde(default)]
    pub documents_by_type: Vec<Value>,
    #[serde(default)]
    pub recent_searches: Vec<RecentSearch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentSearch {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub results_count: u64,
}

/// Accepts RFC 3339 as well as the naive ISO-8601 timestamps FastAPI emits
/// for `datetime.utcnow()`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
