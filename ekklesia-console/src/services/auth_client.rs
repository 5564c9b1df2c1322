use crate::models::{LoginRequest, RegisterRequest, Role, TokenPair, UserSummary};
use crate::services::request_client::{ApiClient, PendingRequest};
use crate::session::SessionEnd;
use crate::utils::jwt::decode_jwt_claims;
use console_core::ConsoleError;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const CURRENT_USER_PATH: &str = "/users/me";

pub struct AuthClient {
    api: Arc<ApiClient>,
}

impl AuthClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Exchange credentials for a token pair and start the session.
    ///
    /// The login call itself never carries credentials and a 401 here is a
    /// plain "invalid credentials", not a refresh trigger.
    pub async fn login(&self, email: &str, password: &Secret<String>) -> Result<(), ConsoleError> {
        let request = PendingRequest::post(LOGIN_PATH)
            .skip_auth()
            .json(&LoginRequest {
                email,
                password: password.expose_secret(),
            })?;

        let tokens: TokenPair = self.api.send_json(request).await?;

        match decode_jwt_claims(tokens.access_token.expose_secret()) {
            Ok(claims) => tracing::info!(
                user_id = %claims.sub,
                expires_at = ?claims.expires_at(),
                "User logged in successfully"
            ),
            Err(_) => tracing::info!("User logged in successfully"),
        }

        self.api.session().begin(tokens).await
    }

    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &Secret<String>,
    ) -> Result<UserSummary, ConsoleError> {
        let request = PendingRequest::post(REGISTER_PATH)
            .skip_auth()
            .json(&RegisterRequest {
                full_name,
                email,
                password: password.expose_secret(),
                role: Role::Member,
            })?;

        let user: UserSummary = self.api.send_json(request).await?;
        tracing::info!(user_id = user.id, "Account registered");
        Ok(user)
    }

    /// Load the profile of the signed-in user and cache it in the session.
    pub async fn fetch_current_user(&self) -> Result<UserSummary, ConsoleError> {
        let user: UserSummary = self.api.get_json(CURRENT_USER_PATH).await?;

        if let Err(e) = self.api.session().set_user(user.clone()).await {
            tracing::warn!(error = %e, "Failed to persist user profile");
        }

        Ok(user)
    }

    pub async fn refresh(&self) -> Result<(), ConsoleError> {
        self.api.refresh_session().await
    }

    pub async fn logout(&self) -> Result<(), ConsoleError> {
        self.api.session().end(SessionEnd::Logout).await
    }
}
