use crate::common::error::{AppError, ServiceResult};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header set by the authenticating gateway once it has resolved the caller.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The caller on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: i64,
}

fn get_caller_identity(parts: &Parts) -> ServiceResult<CallerIdentity> {
    let Some(header) = parts.headers.get(USER_ID_HEADER) else {
        return Err(AppError::Unauthorized);
    };
    let user_id = header
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|user_id| *user_id > 0)
        .ok_or(AppError::Unauthorized)?;
    Ok(CallerIdentity { user_id })
}

impl<S: Sync + Send> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        get_caller_identity(parts)
    }
}
