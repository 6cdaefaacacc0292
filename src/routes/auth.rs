use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::HeaderValue;
use axum::http::request::Parts;
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{
    Authorization,
    authorization::{Bearer, Credentials},
};
use tracing::instrument;

use crate::errors::ApiError;
use crate::models::user::UserModel;
use crate::startup::AppState;

/// The caller behind a valid `Authorization: Token <key>` (or `Bearer <key>`)
/// header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserModel);

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    #[instrument(name = "Authenticating caller", skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).await.ok_or_else(|| {
            tracing::warn!("No token found in Authorization header");
            ApiError::Authentication
        })?;

        let user = state.auth_service.authenticate_token(&token).await?;
        Ok(Self(user))
    }
}

/// `Authorization: Token <key>` credentials.
#[derive(Debug, Clone)]
pub struct Token(HeaderValue);

impl Token {
    pub fn key(&self) -> &str {
        self.0
            .to_str()
            .ok()
            .and_then(|value| value.get(Self::SCHEME.len()..))
            .unwrap_or_default()
            .trim()
    }
}

impl Credentials for Token {
    const SCHEME: &'static str = "Token";

    fn decode(value: &HeaderValue) -> Option<Self> {
        let token = Self(value.clone());
        (!token.key().is_empty()).then_some(token)
    }

    fn encode(&self) -> HeaderValue {
        self.0.clone()
    }
}

async fn extract_token(parts: &mut Parts) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        parts.extract::<TypedHeader<Authorization<Bearer>>>().await
    {
        return Some(bearer.token().to_string());
    }

    let TypedHeader(Authorization(token)) = parts
        .extract::<TypedHeader<Authorization<Token>>>()
        .await
        .ok()?;
    Some(token.key().to_string())
}
