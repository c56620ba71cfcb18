//! docsearch: client for the document search and RAG backend.
//!
//! The backend does the real work (chunking, embeddings, vector search,
//! answer synthesis). This crate keeps the user's session, validates input
//! before it leaves the machine, talks to the HTTP API and renders what comes
//! back.

pub mod action;
pub mod api;
pub mod app;
pub mod config;
pub mod prefs;
pub mod search;
pub mod session;
pub mod shell;
pub mod store;
pub mod vault;
pub mod view;

pub use api::{ApiClient, ClientError, Result};
pub use app::App;
pub use config::Config;
pub use session::{Session, SessionManager};
