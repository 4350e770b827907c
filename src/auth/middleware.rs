use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::Utc;

use crate::app::AppState;
use crate::auth::models::{AuthenticatedUser, Role, User};
use crate::auth::verifier::TokenVerifier;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

/// Resolve a bearer token to the portal user behind it.
///
/// The token proves identity only. The role is read from the `users`
/// collection, where first-time callers are registered as students.
pub async fn authenticate(
    user_repo: &dyn UserRepository,
    verifier: Option<&TokenVerifier>,
    token: &str,
) -> Result<AuthenticatedUser, AppError> {
    let verifier =
        verifier.ok_or_else(|| AppError::Auth("Authentication is not configured".into()))?;
    let claims = verifier.verify(token).await?;

    let candidate = User {
        uid: claims.sub,
        email: claims.email,
        display_name: claims.name,
        photo_url: claims.picture,
        role: Role::Student,
        created_at: Utc::now(),
    };

    let user = user_repo.get_or_create(candidate).await?;
    Ok(user.into())
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Auth("Missing bearer token".into()))?;

        authenticate(
            state.user_repo.as_ref(),
            state.token_verifier.as_deref(),
            bearer.token(),
        )
        .await
        .map_err(|e| e.or_internal("Failed to authenticate"))
    }
}
