use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::errors::AppError;
use crate::models::user::User;
use crate::profile::repository::ensure_user;
use crate::state::AppState;

/// Raw bearer token from the `Authorization` header. Rejects with 401 when absent.
pub struct BearerToken(pub String);

/// The signed-in user's row, created from the session on first sight.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, AppError> {
        bearer_token(&parts.headers)
            .map(|t| BearerToken(t.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let identity = state.auth.verify(token).await?;
        let user = ensure_user(&state.db, &identity).await?;
        Ok(CurrentUser(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsed() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("bearer  xyz ")), Some("xyz"));
    }

    #[test]
    fn test_other_schemes_and_empty_tokens_rejected() {
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
