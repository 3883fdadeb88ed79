//! Request extractors.
//!
//! The acting user is passed explicitly with every request in the
//! [`USER_HEADER`] header and resolved against the account directory.
//! There is no server-side session. [`AdminUser`] additionally requires
//! the account to hold [`Role::Admin`](campus_types::Role::Admin).

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use campus_registry::RegistryError;
use campus_types::{User, UserId};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the acting user's account id.
pub const USER_HEADER: &str = "x-user-id";

/// The account on whose behalf the request is made.
#[derive(Debug, Clone)]
pub struct ActingUser(pub User);

impl FromRequestParts<Arc<AppState>> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_HEADER} header")))?
            .to_str()
            .map_err(|e| ApiError::Unauthorized(format!("unreadable {USER_HEADER} header: {e}")))?;

        let id = raw
            .trim()
            .parse::<Uuid>()
            .map_err(|e| ApiError::Unauthorized(format!("{USER_HEADER} is not a UUID: {e}")))?;

        match state.store.get_user(UserId::from(id)).await {
            Ok(user) => Ok(Self(user)),
            Err(RegistryError::UserNotFound(user_id)) => {
                tracing::warn!(%user_id, "Request from unknown account");
                Err(ApiError::Unauthorized(format!("unknown account {user_id}")))
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// An acting user with the administrator role. Other accounts are refused
/// with `403 Forbidden`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ActingUser(user) = ActingUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route refused");
            return Err(ApiError::Forbidden(format!(
                "account {} is not an administrator",
                user.id
            )));
        }
        Ok(Self(user))
    }
}
