//! Gateway Authentication Module
//!
//! Resolves the caller's bearer token to a user through an `Authenticator`
//! collaborator. Handlers take `RequireAuth` to get the user id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use screentask_core::TaskError;

use crate::routes::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
}

/// Authentication collaborator: bearer token to user.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, TaskError>;
}

/// Validates tokens against a Supabase-compatible `auth/v1/user` endpoint.
pub struct SupabaseAuthenticator {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseAuthenticator {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

#[async_trait]
impl Authenticator for SupabaseAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, TaskError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| TaskError::Authentication(format!("auth request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaskError::Authentication(format!("auth returned {status}: {body}")));
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| TaskError::Authentication(format!("invalid auth response: {e}")))?;
        if user.id.is_empty() {
            return Err(TaskError::Authentication("auth returned no user".to_string()));
        }
        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
        })
    }
}

/// Fixed token-to-user map for tests and local runs.
#[derive(Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.users.insert(
            token.into(),
            AuthenticatedUser {
                id: user_id.into(),
                email: None,
            },
        );
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, TaskError> {
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| TaskError::Authentication("unknown token".to_string()))
    }
}

/// Extractor that rejects the request with 401 unless the bearer token
/// resolves to a user.
pub struct RequireAuth(pub AuthenticatedUser);

#[axum::async_trait]
impl FromRequestParts<Arc<GatewayState>> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|val| val.to_str().ok());

        let Some(token) = auth_header.and_then(bearer_token) else {
            warn!("Missing or invalid Authorization header");
            return Err(TaskError::Authentication("missing credentials".to_string()).into());
        };

        match state.authenticator.authenticate(token).await {
            Ok(user) => Ok(RequireAuth(user)),
            Err(e) => {
                warn!(error = %e, "Rejected bearer token");
                Err(e.into())
            }
        }
    }
}

/// Token of a `Bearer` Authorization header; the scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn test_static_authenticator() {
        let auth = StaticAuthenticator::new().with_user("token-1", "user-1");
        assert_eq!(auth.authenticate("token-1").await.unwrap().id, "user-1");
        assert!(matches!(
            auth.authenticate("nope").await,
            Err(TaskError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_supabase_authenticator_resolves_user() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/auth/v1/user")
            .match_header("authorization", "Bearer user-jwt")
            .match_header("apikey", "anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"user-1","email":"me@example.com","aud":"authenticated"}"#)
            .create_async()
            .await;

        let auth = SupabaseAuthenticator::new(server.url(), "anon-key");
        let user = auth.authenticate("user-jwt").await.unwrap();

        mock.assert_async().await;
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("me@example.com"));
    }

    #[tokio::test]
    async fn test_supabase_authenticator_rejects_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/v1/user")
            .with_status(401)
            .with_body(r#"{"msg":"invalid JWT"}"#)
            .create_async()
            .await;

        let auth = SupabaseAuthenticator::new(server.url(), "anon-key");
        let err = auth.authenticate("expired").await.unwrap_err();
        assert!(matches!(err, TaskError::Authentication(ref d) if d.contains("401")));
    }
}
