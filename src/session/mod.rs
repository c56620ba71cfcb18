//! Session Manager: login, signup, logout and the persisted current user.
//!
//! A session is the pair (`token`, `user`) in the [`LocalStore`]. A missing
//! or empty token means logged out; a user entry that does not parse is
//! treated the same way.

use std::sync::Arc;

use crate::api::schema::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use crate::api::{ApiClient, ClientError, Operation, Result, UserProfile};
use crate::store::{LocalStore, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

pub struct SessionManager {
    store: Arc<LocalStore>,
}

impl SessionManager {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub async fn login(&self, api: &ApiClient, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::validation("Email and password are required"));
        }

        tracing::info!(email, "Logging in");
        let response: LoginResponse = api
            .post_json(
                Operation::Login,
                "/api/auth/login",
                &LoginRequest { email, password },
            )
            .await?;

        let user_json =
            serde_json::to_string(&response.user).map_err(|e| ClientError::Store(e.to_string()))?;
        self.store.set_many(&[
            (TOKEN_KEY, response.access_token.clone()),
            (USER_KEY, user_json),
        ])?;
        api.set_token(Some(response.access_token.clone()));

        Ok(Session {
            token: response.access_token,
            user: response.user,
        })
    }

    /// Register an account. Does not log in; the caller sends the user to
    /// `login` afterwards.
    pub async fn signup(
        &self,
        api: &ApiClient,
        full_name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<SignupResponse> {
        if password != confirm_password {
            return Err(ClientError::validation("Passwords do not match!"));
        }
        let (full_name, email) = (full_name.trim(), email.trim());
        if full_name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ClientError::validation(
                "Full name, email and password are required",
            ));
        }

        tracing::info!(email, "Creating account");
        api.post_json(
            Operation::Signup,
            "/api/auth/signup",
            &SignupRequest {
                full_name,
                email,
                password,
            },
        )
        .await
    }

    /// Forget the session and stop sending its token. UI preferences stay.
    pub fn logout(&self, api: &ApiClient) -> Result<()> {
        tracing::info!("Clearing session");
        api.set_token(None);
        self.store.remove(&[TOKEN_KEY, USER_KEY])
    }

    pub fn current_user(&self) -> Option<Session> {
        let token = self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())?;
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                tracing::debug!("Stored user is malformed: {}", e);
                None
            }
        }
    }

    /// The current session, or `NotAuthenticated` for views that need one.
    pub fn require(&self) -> Result<Session> {
        self.current_user().ok_or(ClientError::NotAuthenticated)
    }

    /// Ask the backend who the stored token belongs to.
    pub async fn me(&self, api: &ApiClient) -> Result<UserProfile> {
        let session = self.require()?;
        if !api.has_token() {
            api.set_token(Some(session.token));
        }
        api.get_json(Operation::Profile, "/api/auth/me").await
    }
}

/// 0–100 in steps of 25: length ≥ 8, a lowercase letter, an uppercase letter,
/// a digit.
pub fn password_strength(password: &str) -> u8 {
    let checks = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
    ];
    checks.iter().filter(|passed| **passed).count() as u8 * 25
}
