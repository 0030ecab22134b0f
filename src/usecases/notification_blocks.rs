use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::usecases::users;
use tracing::info;

/// Stops notifications from `peer_id` reaching `user_id`. Blocking twice is a no-op.
pub async fn block<C: Context>(ctx: &C, user_id: i64, peer_id: i64) -> ServiceResult<()> {
    if user_id == peer_id {
        return Err(AppError::NotificationBlocksSelfTarget);
    }
    users::ensure_exists(ctx, peer_id).await?;
    match ctx.notification_blocks().insert(user_id, peer_id).await {
        Ok(()) => {
            info!(user_id, peer_id, "Friend notifications blocked");
            Ok(())
        }
        Err(e) => unexpected(e),
    }
}

/// Lifts a block; unblocking a pair that was never blocked is a no-op.
pub async fn unblock<C: Context>(ctx: &C, user_id: i64, peer_id: i64) -> ServiceResult<()> {
    if user_id == peer_id {
        return Err(AppError::NotificationBlocksSelfTarget);
    }
    match ctx.notification_blocks().delete(user_id, peer_id).await {
        Ok(()) => {
            info!(user_id, peer_id, "Friend notifications unblocked");
            Ok(())
        }
        Err(e) => unexpected(e),
    }
}

pub async fn is_blocked<C: Context>(ctx: &C, user_id: i64, peer_id: i64) -> ServiceResult<bool> {
    match ctx.notification_blocks().exists(user_id, peer_id).await {
        Ok(blocked) => Ok(blocked),
        Err(e) => unexpected(e),
    }
}
