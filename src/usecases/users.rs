use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::models::users::UserProfile;

pub async fn fetch_one<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<UserProfile> {
    match ctx.users().fetch_one(user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::UsersNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_one_by_connect_code<C: Context>(
    ctx: &C,
    connect_code: &str,
) -> ServiceResult<UserProfile> {
    match ctx.users().fetch_one_by_connect_code(connect_code.trim()).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::UsersNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn ensure_exists<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<()> {
    match ctx.users().exists(user_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::UsersNotFound),
        Err(e) => unexpected(e),
    }
}
