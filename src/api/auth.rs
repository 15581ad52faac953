use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::database::models::auth_token::AuthToken;
use crate::error::AppError;
use crate::state::AppState;
use crate::viewer::Viewer;

const TOKEN_PREFIX: &str = "Token ";

/// `Authorization: Token <key>`. No header means an anonymous viewer, while
/// a header that does not resolve to a user is rejected.
#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Viewer::Anonymous);
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(TOKEN_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)?
            .to_owned();

        let user = state
            .run(move |connection| AuthToken::resolve(connection, &token))
            .await?
            .ok_or(AppError::Unauthorized)?;

        debug!("Request authenticated as user {}", user.id);
        Ok(Viewer::User(user))
    }
}
