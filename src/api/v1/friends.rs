use crate::api::RequestContext;
use crate::common::error::{ServiceResponse, ServiceResult};
use crate::models::friends::{FriendCountView, FriendView, RelationshipStatusView};
use crate::usecases::{notification_blocks, relationships};
use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;

pub async fn list(ctx: RequestContext) -> ServiceResponse<Vec<FriendView>> {
    let friends = relationships::fetch_friends(&ctx, ctx.user_id).await?;
    Ok(Json(friends))
}

pub async fn count(ctx: RequestContext) -> ServiceResponse<FriendCountView> {
    let count = relationships::fetch_friend_count(&ctx, ctx.user_id).await?;
    Ok(Json(count))
}

pub async fn remove(ctx: RequestContext, Path(friend_id): Path<i64>) -> ServiceResult<StatusCode> {
    relationships::remove(&ctx, ctx.user_id, friend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn status(
    ctx: RequestContext,
    Path(other_id): Path<i64>,
) -> ServiceResponse<RelationshipStatusView> {
    let status = relationships::fetch_status(&ctx, ctx.user_id, other_id).await?;
    Ok(Json(status))
}

pub async fn block_notifications(
    ctx: RequestContext,
    Path(peer_id): Path<i64>,
) -> ServiceResult<StatusCode> {
    notification_blocks::block(&ctx, ctx.user_id, peer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unblock_notifications(
    ctx: RequestContext,
    Path(peer_id): Path<i64>,
) -> ServiceResult<StatusCode> {
    notification_blocks::unblock(&ctx, ctx.user_id, peer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
