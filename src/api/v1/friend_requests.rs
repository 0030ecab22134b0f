use crate::api::RequestContext;
use crate::common::error::{AppError, ServiceResponse, ServiceResult};
use crate::models::friends::{ReceivedRequestView, SendFriendRequestArgs, SentRequestView};
use crate::usecases::relationships;
use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use tracing::debug;

pub async fn send(
    ctx: RequestContext,
    args: Result<Json<SendFriendRequestArgs>, JsonRejection>,
) -> ServiceResult<StatusCode> {
    let Json(args) = args.map_err(|e| {
        debug!("Rejected friend request body: {e}");
        AppError::DecodingRequestFailed
    })?;
    match (args.target_id, args.connect_code.as_deref()) {
        (Some(target_id), None) => {
            relationships::send_request(&ctx, ctx.user_id, target_id).await?;
        }
        (None, Some(connect_code)) => {
            relationships::send_request_by_connect_code(&ctx, ctx.user_id, connect_code).await?;
        }
        _ => return Err(AppError::DecodingRequestFailed),
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn received(ctx: RequestContext) -> ServiceResponse<Vec<ReceivedRequestView>> {
    let requests = relationships::fetch_received(&ctx, ctx.user_id).await?;
    Ok(Json(requests))
}

pub async fn sent(ctx: RequestContext) -> ServiceResponse<Vec<SentRequestView>> {
    let requests = relationships::fetch_sent(&ctx, ctx.user_id).await?;
    Ok(Json(requests))
}

pub async fn accept(ctx: RequestContext, Path(request_id): Path<i64>) -> ServiceResult<StatusCode> {
    relationships::respond(&ctx, request_id, ctx.user_id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reject(ctx: RequestContext, Path(request_id): Path<i64>) -> ServiceResult<StatusCode> {
    relationships::respond(&ctx, request_id, ctx.user_id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel(ctx: RequestContext, Path(request_id): Path<i64>) -> ServiceResult<StatusCode> {
    relationships::cancel(&ctx, request_id, ctx.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
