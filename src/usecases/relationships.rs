use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::models::friends::{
    FriendCountView, FriendView, PeerRelation, ReceivedRequestView, RelationshipStatusView,
    SentRequestView,
};
use crate::models::notifications::Notification;
use crate::models::relationships::{NewRelationship, Relationship, RelationshipStatus, UserPair};
use crate::repositories::StoreError;
use crate::repositories::relationships::RelationshipTx;
use crate::usecases::{notifications, users};
use chrono::{TimeDelta, Utc};
use hashbrown::HashSet;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hard cap on accepted relationships per user.
pub const MAX_FRIENDS: u64 = 5;

const MAX_TRANSACTION_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 20;

enum TxError {
    App(AppError),
    Store(StoreError),
}

impl From<AppError> for TxError {
    fn from(e: AppError) -> Self {
        TxError::App(e)
    }
}

impl From<StoreError> for TxError {
    fn from(e: StoreError) -> Self {
        TxError::Store(e)
    }
}

type TxResult<T> = Result<T, TxError>;
type TxFuture<'t, T> = Pin<Box<dyn Future<Output = TxResult<T>> + Send + 't>>;

fn retry_backoff(attempt: u32) -> Duration {
    let jitter = rand::random_range(0..RETRY_BACKOFF_MS);
    Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64 + jitter)
}

/// Runs `op` as one atomic unit, replaying it when the store aborts the
/// transaction over a lock conflict. A pair uniqueness violation is reported
/// as a pending request, since that is the only way two writers can collide
/// on a pair.
async fn in_transaction<C, T, F>(ctx: &C, mut op: F) -> ServiceResult<T>
where
    C: Context,
    T: Send,
    F: for<'t> FnMut(&'t mut dyn RelationshipTx) -> TxFuture<'t, T> + Send,
{
    let mut attempt = 1;
    loop {
        match attempt_transaction(ctx, &mut op).await {
            Ok(value) => return Ok(value),
            Err(TxError::App(e)) => return Err(e),
            Err(TxError::Store(StoreError::PairConflict)) => {
                return Err(AppError::RelationshipsRequestExists);
            }
            Err(TxError::Store(StoreError::Retryable(e))) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                warn!(attempt, "Relationship transaction aborted, retrying: {e}");
                tokio::time::sleep(retry_backoff(attempt)).await;
                attempt += 1;
            }
            Err(TxError::Store(e)) => return unexpected(e),
        }
    }
}

async fn attempt_transaction<C, T, F>(ctx: &C, op: &mut F) -> TxResult<T>
where
    C: Context,
    T: Send,
    F: for<'t> FnMut(&'t mut dyn RelationshipTx) -> TxFuture<'t, T> + Send,
{
    let mut tx = ctx.relationships().begin().await?;
    let value = op(&mut *tx).await?;
    tx.commit().await?;
    Ok(value)
}

async fn ensure_capacity(tx: &mut dyn RelationshipTx, user_id: i64) -> TxResult<()> {
    let accepted = tx.count_accepted(user_id).await?;
    if accepted >= MAX_FRIENDS {
        info!(user_id, accepted, "Friend limit reached");
        return Err(AppError::RelationshipsFriendLimit.into());
    }
    Ok(())
}

async fn create_request(
    tx: &mut dyn RelationshipTx,
    pair: UserPair,
    requester_id: i64,
) -> TxResult<Relationship> {
    let target_id = pair
        .other(requester_id)
        .ok_or(AppError::InternalServerError("requester is not part of the pair"))?;
    ensure_capacity(tx, requester_id).await?;
    ensure_capacity(tx, target_id).await?;

    let history = tx.find_pair(pair).await?;
    if history
        .iter()
        .any(|row| row.status == RelationshipStatus::Accepted)
    {
        return Err(AppError::RelationshipsAlreadyFriends.into());
    }
    if history
        .iter()
        .any(|row| row.status == RelationshipStatus::Pending)
    {
        return Err(AppError::RelationshipsRequestExists.into());
    }

    let superseded = tx.delete_terminal(pair).await?;
    if superseded > 0 {
        debug!(requester_id, target_id, superseded, "Superseded relationship history");
    }
    let relationship = tx
        .insert(NewRelationship {
            pair,
            requester_id,
            created_at: Utc::now(),
        })
        .await?;
    Ok(relationship)
}

async fn settle_request(
    tx: &mut dyn RelationshipTx,
    request_id: i64,
    responder_id: i64,
    accept: bool,
) -> TxResult<Relationship> {
    let Some(mut relationship) = tx.find_by_id(request_id).await? else {
        return Err(AppError::RelationshipsNotFound.into());
    };
    if !relationship.is_receiver(responder_id) {
        return Err(AppError::RelationshipsForbidden.into());
    }
    if relationship.status != RelationshipStatus::Pending {
        return Err(AppError::RelationshipsNotPending.into());
    }

    let outcome = match accept {
        true => {
            tx.lock_participants(relationship.pair()).await?;
            ensure_capacity(tx, relationship.requester_id).await?;
            ensure_capacity(tx, responder_id).await?;
            RelationshipStatus::Accepted
        }
        false => RelationshipStatus::Rejected,
    };
    relationship.transition(outcome, Utc::now())?;
    tx.save(&relationship).await?;
    Ok(relationship)
}

async fn withdraw_request(
    tx: &mut dyn RelationshipTx,
    request_id: i64,
    requester_id: i64,
) -> TxResult<Relationship> {
    let Some(mut relationship) = tx.find_by_id(request_id).await? else {
        return Err(AppError::RelationshipsNotFound.into());
    };
    if !relationship.is_requester(requester_id) {
        return Err(AppError::RelationshipsForbidden.into());
    }
    relationship.transition(RelationshipStatus::Cancelled, Utc::now())?;
    tx.save(&relationship).await?;
    Ok(relationship)
}

async fn delete_friendship(tx: &mut dyn RelationshipTx, pair: UserPair) -> TxResult<Relationship> {
    let rows = tx.find_pair(pair).await?;
    let Some(friendship) = rows
        .into_iter()
        .find(|row| row.status == RelationshipStatus::Accepted)
    else {
        return Err(AppError::RelationshipsNotFound.into());
    };
    tx.delete(friendship.relationship_id).await?;
    Ok(friendship)
}

pub async fn send_request<C: Context>(
    ctx: &C,
    requester_id: i64,
    target_id: i64,
) -> ServiceResult<Relationship> {
    let Some(pair) = UserPair::new(requester_id, target_id) else {
        return Err(AppError::RelationshipsSelfRequest);
    };
    let requester = users::fetch_one(ctx, requester_id).await?;
    users::ensure_exists(ctx, target_id).await?;

    let relationship = in_transaction(ctx, move |tx| {
        Box::pin(create_request(tx, pair, requester_id))
    })
    .await?;
    info!(
        relationship_id = relationship.relationship_id,
        requester_id, target_id, "Friend request sent"
    );

    let notification =
        Notification::friend_request(target_id, &requester, relationship.relationship_id);
    notifications::dispatch(ctx, notification).await;
    Ok(relationship)
}

pub async fn send_request_by_connect_code<C: Context>(
    ctx: &C,
    requester_id: i64,
    connect_code: &str,
) -> ServiceResult<Relationship> {
    let target = users::fetch_one_by_connect_code(ctx, connect_code).await?;
    send_request(ctx, requester_id, target.user_id).await
}

pub async fn respond<C: Context>(
    ctx: &C,
    request_id: i64,
    responder_id: i64,
    accept: bool,
) -> ServiceResult<Relationship> {
    let relationship = in_transaction(ctx, move |tx| {
        Box::pin(settle_request(tx, request_id, responder_id, accept))
    })
    .await?;
    info!(
        relationship_id = request_id,
        responder_id,
        status = relationship.status.as_str(),
        "Friend request answered"
    );

    if relationship.status == RelationshipStatus::Accepted {
        match ctx.users().fetch_one(responder_id).await {
            Ok(Some(responder)) => {
                let notification =
                    Notification::friend_accepted(relationship.requester_id, &responder, request_id);
                notifications::dispatch(ctx, notification).await;
            }
            Ok(None) => warn!(responder_id, "Responder missing, skipping acceptance notification"),
            Err(e) => warn!(
                responder_id,
                "Failed to fetch responder, skipping acceptance notification: {e}"
            ),
        }
    }
    Ok(relationship)
}

pub async fn cancel<C: Context>(
    ctx: &C,
    request_id: i64,
    requester_id: i64,
) -> ServiceResult<Relationship> {
    let relationship = in_transaction(ctx, move |tx| {
        Box::pin(withdraw_request(tx, request_id, requester_id))
    })
    .await?;
    info!(
        relationship_id = request_id,
        requester_id, "Friend request cancelled"
    );
    Ok(relationship)
}

pub async fn remove<C: Context>(ctx: &C, user_id: i64, friend_id: i64) -> ServiceResult<()> {
    let Some(pair) = UserPair::new(user_id, friend_id) else {
        return Err(AppError::RelationshipsNotFound);
    };
    let friendship = in_transaction(ctx, move |tx| Box::pin(delete_friendship(tx, pair))).await?;
    info!(
        relationship_id = friendship.relationship_id,
        user_id, friend_id, "Friend removed"
    );
    Ok(())
}

pub async fn fetch_friends<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<Vec<FriendView>> {
    let accepted = match ctx.relationships().list_accepted(user_id).await {
        Ok(accepted) => accepted,
        Err(e) => return unexpected(e),
    };
    let blocked: HashSet<i64> = match ctx.notification_blocks().fetch_by_subscriber(user_id).await
    {
        Ok(blocks) => blocks.into_iter().map(|b| b.blocked_peer_id).collect(),
        Err(e) => return unexpected(e),
    };

    let mut friends = Vec::with_capacity(accepted.len().min(MAX_FRIENDS as usize));
    for relationship in accepted.into_iter().take(MAX_FRIENDS as usize) {
        let Some(friend_id) = relationship.other_participant(user_id) else {
            continue;
        };
        let friend = match ctx.users().fetch_one(friend_id).await {
            Ok(Some(friend)) => friend,
            Ok(None) => {
                warn!(user_id, friend_id, "Friend missing from user directory");
                continue;
            }
            Err(e) => return unexpected(e),
        };
        let has_recorded_today = match ctx.emotion_activity().has_recorded_today(friend_id).await {
            Ok(recorded) => recorded,
            Err(e) => return unexpected(e),
        };
        friends.push(FriendView {
            friend_id,
            nickname: friend.nickname,
            connect_code: friend.connect_code,
            profile_image_url: friend.profile_image_url,
            has_recorded_today,
            notification_blocked: blocked.contains(&friend_id),
        });
    }
    Ok(friends)
}

pub async fn fetch_received<C: Context>(
    ctx: &C,
    user_id: i64,
) -> ServiceResult<Vec<ReceivedRequestView>> {
    let pending = match ctx.relationships().list_pending(user_id, true).await {
        Ok(pending) => pending,
        Err(e) => return unexpected(e),
    };
    let mut requests = Vec::with_capacity(pending.len());
    for relationship in pending {
        let requester_id = relationship.requester_id;
        let requester = match ctx.users().fetch_one(requester_id).await {
            Ok(Some(requester)) => requester,
            Ok(None) => {
                warn!(user_id, requester_id, "Requester missing from user directory");
                continue;
            }
            Err(e) => return unexpected(e),
        };
        requests.push(ReceivedRequestView {
            request_id: relationship.relationship_id,
            requester_id,
            requester_nickname: requester.nickname,
            requester_connect_code: requester.connect_code,
            requester_profile_image_url: requester.profile_image_url,
            created_at: relationship.created_at,
        });
    }
    Ok(requests)
}

pub async fn fetch_sent<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<Vec<SentRequestView>> {
    let pending = match ctx.relationships().list_pending(user_id, false).await {
        Ok(pending) => pending,
        Err(e) => return unexpected(e),
    };
    let mut requests = Vec::with_capacity(pending.len());
    for relationship in pending {
        let receiver_id = relationship.receiver_id();
        let receiver = match ctx.users().fetch_one(receiver_id).await {
            Ok(Some(receiver)) => receiver,
            Ok(None) => {
                warn!(user_id, receiver_id, "Receiver missing from user directory");
                continue;
            }
            Err(e) => return unexpected(e),
        };
        requests.push(SentRequestView {
            request_id: relationship.relationship_id,
            receiver_id,
            receiver_nickname: receiver.nickname,
            receiver_connect_code: receiver.connect_code,
            receiver_profile_image_url: receiver.profile_image_url,
            created_at: relationship.created_at,
        });
    }
    Ok(requests)
}

pub async fn fetch_status<C: Context>(
    ctx: &C,
    user_id: i64,
    other_id: i64,
) -> ServiceResult<RelationshipStatusView> {
    let Some(pair) = UserPair::new(user_id, other_id) else {
        return Err(AppError::RelationshipsSelfRequest);
    };
    let relationship = match ctx.relationships().find_pair(pair).await {
        Ok(relationship) => relationship,
        Err(e) => return unexpected(e),
    };
    // The store only hands back pending or accepted rows
    let (relation, relationship_id) = match relationship {
        None => (PeerRelation::None, None),
        Some(r) if r.status == RelationshipStatus::Accepted => {
            (PeerRelation::Friends, Some(r.relationship_id))
        }
        Some(r) if r.is_requester(user_id) => (PeerRelation::RequestSent, Some(r.relationship_id)),
        Some(r) => (PeerRelation::RequestReceived, Some(r.relationship_id)),
    };
    let view = RelationshipStatusView {
        relation,
        relationship_id,
    };
    Ok(view)
}

pub async fn fetch_friend_count<C: Context>(
    ctx: &C,
    user_id: i64,
) -> ServiceResult<FriendCountView> {
    match ctx.relationships().count_accepted(user_id).await {
        Ok(count) => Ok(FriendCountView {
            count,
            limit: MAX_FRIENDS,
        }),
        Err(e) => unexpected(e),
    }
}

/// Deletes rejected/cancelled history older than `retention`.
pub async fn purge_history<C: Context>(ctx: &C, retention: TimeDelta) -> ServiceResult<u64> {
    if retention < TimeDelta::zero() {
        return Err(AppError::InternalServerError(
            "relationship history retention is negative",
        ));
    }
    let Some(cutoff) = Utc::now().checked_sub_signed(retention) else {
        return Err(AppError::InternalServerError(
            "relationship history retention is out of range",
        ));
    };
    match ctx.relationships().purge_terminal_before(cutoff).await {
        Ok(purged) => Ok(purged),
        Err(e) => unexpected(e),
    }
}
