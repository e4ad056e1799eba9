use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    db::users,
    error::{AppError, Result},
    routes::auth::decode_token,
    AppState,
};

/// The authenticated caller. Only the id is carried; ownership checks compare
/// it against the author/owner columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

/// Verifies the token and confirms the user still exists.
pub async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser> {
    let claims = decode_token(token, &state.config.jwt_secret)?;

    if !users::exists(&state.db.pool, claims.user_id).await? {
        tracing::debug!("Token for missing user {}", claims.user_id);
        return Err(AppError::Unauthorized);
    }

    Ok(AuthUser {
        id: claims.user_id,
    })
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;
    let user = authenticate(&state, bearer.token()).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

// Uses the identity attached by `auth_middleware` when present; routes that
// mix public and private methods authenticate here instead.
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let user = authenticate(state, bearer.token()).await?;
        parts.extensions.insert(user);
        Ok(user)
    }
}
