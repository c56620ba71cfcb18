//! Turns backend responses into view state and terminal text.
//!
//! View state is computed first (`SearchView`, `DocumentsView`) so the
//! "nothing here" cases are explicit values rather than rendering accidents.

use std::fmt::Write as _;

use console::Style;

use crate::api::schema::{parse_timestamp, RecentSearch};
use crate::api::{AnalyticsStats, DocumentRecord, HealthResponse, SearchHit, SearchResponse, ServerInfo, UserProfile};
use crate::prefs::{Preferences, Theme};
use crate::vault::validate::kind_label;
use crate::vault::{DeleteOutcome, UploadReport};

pub const NO_RESULTS: &str = "No results found. Try different keywords.";
pub const NO_DOCUMENTS: &str = "No documents uploaded yet";
pub const NO_ACTIVITY: &str = "No recent search activity";

#[derive(Debug, PartialEq)]
pub enum SearchView<'a> {
    /// No hits and no synthesized answer. Not an error.
    NoResults,
    Results {
        answer: Option<&'a str>,
        hits: &'a [SearchHit],
        total: usize,
        processing_time: f64,
    },
}

impl<'a> SearchView<'a> {
    pub fn from_response(response: &'a SearchResponse) -> Self {
        let answer = response.answer();
        if response.results.is_empty() && answer.is_none() {
            return SearchView::NoResults;
        }
        SearchView::Results {
            answer,
            hits: &response.results,
            total: response.total_results.max(response.results.len()),
            processing_time: response.processing_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub kind: &'static str,
    pub file_name: String,
    pub chunks: u64,
    pub uploaded: String,
    pub short_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentsView {
    Empty,
    Listing(Vec<DocumentRow>),
}

impl DocumentsView {
    pub fn from_documents(documents: &[DocumentRecord]) -> Self {
        if documents.is_empty() {
            return DocumentsView::Empty;
        }
        DocumentsView::Listing(
            documents
                .iter()
                .map(|doc| DocumentRow {
                    kind: kind_label(doc.name()),
                    file_name: doc.name().to_string(),
                    chunks: doc.chunks(),
                    uploaded: doc
                        .uploaded_at()
                        .map(|dt| dt.format("%b %-d, %Y").to_string())
                        .unwrap_or_else(|| "Unknown date".to_string()),
                    short_id: short_id(doc.id().unwrap_or("unknown")),
                })
                .collect(),
        )
    }
}

/// First 8 characters of a document id.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// `0.8734` → `87.3%`
pub fn relevance(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Error,
    Warning,
    Info,
}

impl Notice {
    fn icon(self) -> &'static str {
        match self {
            Notice::Success => "✅",
            Notice::Error => "❌",
            Notice::Warning => "⚠️",
            Notice::Info => "ℹ️",
        }
    }
}

/// Renders view state as text, styled according to the user's preferences.
#[derive(Debug, Clone)]
pub struct Renderer {
    prefs: Preferences,
    heading: Style,
    accent: Style,
    muted: Style,
}

impl Renderer {
    pub fn new(prefs: Preferences) -> Self {
        let (heading, accent, muted) = match prefs.theme {
            Theme::Dark => (
                Style::new().bold().magenta(),
                Style::new().cyan(),
                Style::new().dim(),
            ),
            Theme::Light => (Style::new().bold(), Style::new(), Style::new()),
        };
        Self {
            prefs,
            heading,
            accent,
            muted,
        }
    }

    pub fn compact(&self) -> bool {
        self.prefs.sidebar_collapsed
    }

    pub fn notice(&self, kind: Notice, message: &str) -> String {
        format!("{} {}", kind.icon(), message)
    }

    pub fn welcome(&self, user: &UserProfile) -> String {
        let name = user.first_name();
        if name.is_empty() {
            "Welcome back! 👋".to_string()
        } else {
            format!("Welcome back, {}! 👋", self.heading.apply_to(name))
        }
    }

    pub fn user(&self, user: &UserProfile) -> String {
        format!(
            "{} <{}>",
            self.heading.apply_to(&user.full_name),
            user.email
        )
    }

    pub fn search(&self, view: &SearchView<'_>) -> String {
        let mut out = String::new();
        match view {
            SearchView::NoResults => out.push_str(NO_RESULTS),
            SearchView::Results {
                answer,
                hits,
                total,
                processing_time,
            } => {
                if let Some(answer) = answer {
                    let _ = writeln!(out, "{}", self.heading.apply_to("🤖 AI-Generated Answer"));
                    let _ = writeln!(out, "{answer}");
                }
                if !hits.is_empty() {
                    if answer.is_some() {
                        out.push('\n');
                    }
                    let _ = writeln!(out, "{}", self.heading.apply_to("📄 Relevant Documents"));
                    for (index, hit) in hits.iter().enumerate() {
                        self.search_hit(&mut out, index + 1, hit);
                    }
                }
                let _ = write!(
                    out,
                    "{}",
                    self.muted.apply_to(format!(
                        "Found {total} results in {processing_time:.2}s"
                    ))
                );
            }
        }
        out
    }

    fn search_hit(&self, out: &mut String, number: usize, hit: &SearchHit) {
        let score = self
            .accent
            .apply_to(format!("Relevance: {}", relevance(hit.similarity_score)));
        if self.compact() {
            let _ = writeln!(out, "#{number} {score} {} (chunk {})", hit.file_name, hit.chunk_id);
            return;
        }
        let _ = writeln!(out, "#{number}  {score}");
        let _ = writeln!(out, "   {}", self.heading.apply_to(&hit.file_name));
        for line in hit.content.lines().filter(|l| !l.trim().is_empty()) {
            let _ = writeln!(out, "   {}", line.trim());
        }
        let _ = writeln!(out, "   {}", self.muted.apply_to(format!("Chunk {}", hit.chunk_id)));
    }

    pub fn documents(&self, view: &DocumentsView) -> String {
        let rows = match view {
            DocumentsView::Empty => {
                return format!("{NO_DOCUMENTS}\nUpload your first document with `docsearch upload <file>`.")
            }
            DocumentsView::Listing(rows) => rows,
        };

        let mut out = String::new();
        for row in rows {
            if self.compact() {
                let _ = writeln!(out, "{:<8} {:<5} {}", row.short_id, row.kind, row.file_name);
                continue;
            }
            let _ = writeln!(
                out,
                "[{}] {}",
                self.accent.apply_to(row.kind),
                self.heading.apply_to(&row.file_name)
            );
            let _ = writeln!(out, "      {} chunks • Uploaded {}", row.chunks, row.uploaded);
            let _ = writeln!(out, "      {}", self.muted.apply_to(format!("ID: {}...", row.short_id)));
        }
        let _ = write!(out, "{} document(s)", rows.len());
        out
    }

    pub fn upload(&self, report: &UploadReport) -> String {
        format!(
            "Document \"{}\" uploaded successfully! Processing {} chunks.",
            report.file_name, report.chunks_created
        )
    }

    pub fn delete(&self, outcome: &DeleteOutcome) -> String {
        match outcome {
            DeleteOutcome::Deleted {
                file_name,
                chunks_deleted,
            } => format!("Document \"{file_name}\" deleted successfully ({chunks_deleted} chunks removed)"),
            DeleteOutcome::Cancelled => "Delete cancelled".to_string(),
        }
    }

    pub fn health(&self, health: &HealthResponse) -> String {
        let mut out = format!("Status: {}", self.heading.apply_to(&health.status));
        if let Some(connected) = health.database_connected {
            let _ = write!(
                out,
                "\nDatabase: {}",
                if connected { "connected" } else { "disconnected" }
            );
        }
        out
    }

    pub fn info(&self, info: &ServerInfo) -> String {
        let mut out = String::new();
        let unknown = || "?".to_string();
        let _ = writeln!(
            out,
            "Embedding model: {}",
            info.embedding_model.clone().unwrap_or_else(unknown)
        );
        if let Some(dims) = info.embedding_dimensions {
            let _ = writeln!(out, "Embedding dimensions: {dims}");
        }
        let _ = writeln!(
            out,
            "Chunking: {} chars, {} overlap",
            info.chunk_size.map_or_else(unknown, |n| n.to_string()),
            info.chunk_overlap.map_or_else(unknown, |n| n.to_string())
        );
        if let Some(mb) = info.max_file_size_mb {
            let _ = writeln!(out, "Max file size: {mb}MB");
        }
        let _ = write!(out, "Formats: {}", info.supported_formats.join(", "));
        out
    }

    pub fn stats(&self, stats: &AnalyticsStats) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.heading.apply_to("📊 Analytics"));
        let _ = writeln!(out, "Documents:  {}", stats.total_documents);
        let _ = writeln!(out, "Searches:   {}", stats.total_searches);
        let _ = writeln!(out, "File types: {}", stats.documents_by_type.len());
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.heading.apply_to("Recent activity"));
        if stats.recent_searches.is_empty() {
            out.push_str(NO_ACTIVITY);
            return out;
        }
        let lines: Vec<String> = stats
            .recent_searches
            .iter()
            .map(|search| self.recent_search(search))
            .collect();
        out.push_str(&lines.join("\n"));
        out
    }

    fn recent_search(&self, search: &RecentSearch) -> String {
        let count = search.results_count;
        let plural = if count == 1 { "" } else { "s" };
        let time = search
            .processing_time
            .map_or_else(|| "N/A".to_string(), |t| format!("{t}s"));
        let when = match search.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw)
                .map(|dt| dt.format("%d %b %Y, %H:%M").to_string())
                .unwrap_or_else(|| raw.to_string()),
            None => "Unknown".to_string(),
        };
        format!(
            "🔍 {}  {} result{}  {}  {}",
            self.accent.apply_to(&search.query),
            count,
            plural,
            time,
            self.muted.apply_to(when)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Renderer {
        Renderer::new(Preferences::default())
    }

    fn hit(name: &str, score: f64) -> SearchHit {
        SearchHit {
            content: "Quarterly revenue grew.".into(),
            file_name: name.into(),
            chunk_id: 2,
            similarity_score: score,
            metadata: Default::default(),
        }
    }

    #[test]
    fn empty_results_without_answer_is_no_results() {
        let response = SearchResponse {
            query: "unicorns".into(),
            ..Default::default()
        };
        let view = SearchView::from_response(&response);
        assert_eq!(view, SearchView::NoResults);
        assert_eq!(plain().search(&view), NO_RESULTS);
    }

    #[test]
    fn answer_alone_is_still_a_result() {
        let response = SearchResponse {
            rag_answer: Some("Revenue grew 14%.".into()),
            ..Default::default()
        };
        let view = SearchView::from_response(&response);
        assert!(matches!(view, SearchView::Results { hits, .. } if hits.is_empty()));
        let text = plain().search(&view);
        assert!(text.contains("Revenue grew 14%."));
        assert!(!text.contains(NO_RESULTS));
    }

    #[test]
    fn blank_answer_counts_as_absent() {
        let response = SearchResponse {
            rag_answer: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(SearchView::from_response(&response), SearchView::NoResults);
    }

    #[test]
    fn hits_show_relevance_and_chunk() {
        let response = SearchResponse {
            results: vec![hit("q3.pdf", 0.8734)],
            total_results: 1,
            processing_time: 0.42,
            ..Default::default()
        };
        let text = plain().search(&SearchView::from_response(&response));
        assert!(text.contains("#1"));
        assert!(text.contains("Relevance: 87.3%"));
        assert!(text.contains("q3.pdf"));
        assert!(text.contains("Chunk 2"));
        assert!(text.contains("Found 1 results"));
    }

    #[test]
    fn documents_view_formats_rows() {
        let docs = vec![DocumentRecord {
            document_id: Some("3f2a9c10-1111-2222".into()),
            file_name: Some("contract.docx".into()),
            total_chunks: Some(12),
            upload_date: Some("2025-03-14T09:26:53.589000".into()),
            ..Default::default()
        }];
        let DocumentsView::Listing(rows) = DocumentsView::from_documents(&docs) else {
            panic!("expected a listing");
        };
        assert_eq!(rows[0].kind, "DOCX");
        assert_eq!(rows[0].short_id, "3f2a9c10");
        assert_eq!(rows[0].uploaded, "Mar 14, 2025");
        let text = plain().documents(&DocumentsView::Listing(rows));
        assert!(text.contains("12 chunks • Uploaded Mar 14, 2025"));
        assert!(text.contains("ID: 3f2a9c10..."));
    }

    #[test]
    fn empty_documents_is_not_an_error() {
        let view = DocumentsView::from_documents(&[]);
        assert_eq!(view, DocumentsView::Empty);
        assert!(plain().documents(&view).starts_with(NO_DOCUMENTS));
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let DocumentsView::Listing(rows) = DocumentsView::from_documents(&[DocumentRecord::default()])
        else {
            panic!("expected a listing");
        };
        assert_eq!(rows[0].file_name, "Unknown");
        assert_eq!(rows[0].short_id, "unknown");
        assert_eq!(rows[0].uploaded, "Unknown date");
        assert_eq!(rows[0].chunks, 0);
    }

    #[test]
    fn stats_pluralize_and_fall_back() {
        let stats = AnalyticsStats {
            total_documents: 3,
            total_searches: 2,
            documents_by_type: vec![serde_json::json!({"_id": "pdf", "count": 3})],
            recent_searches: vec![
                RecentSearch {
                    query: "budget".into(),
                    timestamp: None,
                    processing_time: None,
                    results_count: 1,
                },
                RecentSearch {
                    query: "travel".into(),
                    timestamp: Some("2025-01-02T03:04:05".into()),
                    processing_time: Some(0.5),
                    results_count: 4,
                },
            ],
        };
        let text = plain().stats(&stats);
        assert!(text.contains("File types: 1"));
        assert!(text.contains("1 result  N/A"));
        assert!(text.contains("4 results  0.5s"));
        assert!(text.contains("02 Jan 2025, 03:04"));
    }

    #[test]
    fn stats_without_activity() {
        let text = plain().stats(&AnalyticsStats::default());
        assert!(text.ends_with(NO_ACTIVITY));
    }

    #[test]
    fn welcome_uses_first_name() {
        let user = UserProfile {
            id: None,
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            profile_picture: None,
        };
        assert!(plain().welcome(&user).contains("Ada"));
        assert!(!plain().welcome(&user).contains("Lovelace"));
    }
}
