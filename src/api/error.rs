use thiserror::Error;

use crate::action::TransitionError;

pub type Result<T> = std::result::Result<T, ClientError>;

/// A single user-initiated request against the backend. Used to pick the
/// message shown when the server or the network gives us nothing better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Signup,
    Profile,
    Upload,
    ListDocuments,
    DeleteDocument,
    Search,
    Health,
    Info,
    Stats,
}

impl Operation {
    /// Shown for a non-2xx response that carries no `detail`.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Operation::Login => "Login failed",
            Operation::Signup => "Signup failed",
            Operation::Profile => "Failed to load profile",
            Operation::Upload => "Upload failed",
            Operation::ListDocuments => "Error loading documents",
            Operation::DeleteDocument => "Delete failed",
            Operation::Search => "Search failed",
            Operation::Health => "Health check failed",
            Operation::Info => "Failed to load server info",
            Operation::Stats => "Failed to load analytics data",
        }
    }

    /// Shown when the request never produced a response.
    pub fn network_message(self) -> &'static str {
        match self {
            Operation::Login | Operation::Signup | Operation::Profile => {
                "Network error. Please try again."
            }
            Operation::Upload => "Error uploading document. Please try again.",
            Operation::ListDocuments => "Error loading documents",
            Operation::DeleteDocument => "Error deleting document",
            Operation::Search => "Error searching documents. Please try again.",
            Operation::Health | Operation::Info | Operation::Stats => {
                "Cannot connect to server. Make sure the backend is running."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response. `detail` is the server's message when it sent one.
    #[error("{detail}")]
    Application { status: u16, detail: String },

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Not logged in. Run `docsearch login` first.")]
    NotAuthenticated,

    /// Local TLS or builder setup failed; nothing was sent.
    #[error("Could not set up the HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Confirmation prompt failed: {0}")]
    Prompt(String),

    #[error("Client store error: {0}")]
    Store(String),

    #[error("Document cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn transport(op: Operation, source: reqwest::Error) -> Self {
        ClientError::Transport {
            message: op.network_message().to_string(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    /// HTTP status of an application error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}
