use std::fmt;
use std::str::FromStr;

use crate::api::{ClientError, Result};
use crate::store::{LocalStore, SIDEBAR_COLLAPSED_KEY, THEME_KEY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ClientError::validation(format!(
                "Unknown theme '{other}' (expected light or dark)"
            ))),
        }
    }
}

/// UI flags persisted next to the session. Unknown or missing values read
/// as the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    /// Collapsed sidebar in the dashboard; compact one-line output here.
    pub sidebar_collapsed: bool,
}

impl Preferences {
    pub fn load(store: &LocalStore) -> Self {
        let theme = store
            .get(THEME_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let sidebar_collapsed = store.get(SIDEBAR_COLLAPSED_KEY).as_deref() == Some("true");
        Self {
            theme,
            sidebar_collapsed,
        }
    }

    pub fn set_theme(store: &LocalStore, theme: Theme) -> Result<Theme> {
        store.set(THEME_KEY, theme.to_string())?;
        Ok(theme)
    }

    pub fn toggle_theme(store: &LocalStore) -> Result<Theme> {
        let next = Self::load(store).theme.toggled();
        Self::set_theme(store, next)
    }

    pub fn set_sidebar_collapsed(store: &LocalStore, collapsed: bool) -> Result<bool> {
        store.set(SIDEBAR_COLLAPSED_KEY, collapsed.to_string())?;
        Ok(collapsed)
    }

    pub fn toggle_sidebar(store: &LocalStore) -> Result<bool> {
        let next = !Self::load(store).sidebar_collapsed;
        Self::set_sidebar_collapsed(store, next)
    }
}
