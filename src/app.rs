use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiClient;
use crate::config::Config;
use crate::prefs::Preferences;
use crate::search::SearchFacade;
use crate::session::{Session, SessionManager};
use crate::store::LocalStore;
use crate::vault::{DocumentCache, DocumentVault};
use crate::view::Renderer;

const CACHE_FILE: &str = "cache.db";

/// Everything a command needs, wired from one [`Config`].
pub struct App {
    pub config: Config,
    pub store: Arc<LocalStore>,
    pub sessions: SessionManager,
    pub api: Arc<ApiClient>,
    pub vault: DocumentVault,
    pub search: Arc<SearchFacade>,
}

impl App {
    pub fn open(config: Config) -> Result<Self> {
        let data_dir = config.resolve_data_dir()?;
        let store = Arc::new(
            LocalStore::open(&data_dir)
                .with_context(|| format!("Failed to open client store in {}", data_dir.display()))?,
        );
        let sessions = SessionManager::new(store.clone());
        let token = sessions.current_user().map(|s| s.token);

        let api = Arc::new(
            ApiClient::new(&config.api_url, config.request_timeout())?.with_token(token),
        );
        let cache = Arc::new(
            DocumentCache::open(&data_dir.join(CACHE_FILE)).context("Failed to open document cache")?,
        );
        let vault = DocumentVault::new(api.clone(), cache, config.max_upload_bytes);
        let search = Arc::new(SearchFacade::new(
            api.clone(),
            config.default_top_k,
            config.use_rag,
        ));

        tracing::debug!(api_url = %api.base_url(), data_dir = %data_dir.display(), "Client ready");
        Ok(Self {
            config,
            store,
            sessions,
            api,
            vault,
            search,
        })
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::load(&self.store)
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.preferences())
    }

    /// Gate for authenticated views.
    pub fn require_session(&self) -> Result<Session> {
        Ok(self.sessions.require()?)
    }
}
