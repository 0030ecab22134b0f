use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendView {
    pub friend_id: i64,
    pub nickname: String,
    pub connect_code: String,
    pub profile_image_url: Option<String>,
    pub has_recorded_today: bool,
    pub notification_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedRequestView {
    pub request_id: i64,
    pub requester_id: i64,
    pub requester_nickname: String,
    pub requester_connect_code: String,
    pub requester_profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentRequestView {
    pub request_id: i64,
    pub receiver_id: i64,
    pub receiver_nickname: String,
    pub receiver_connect_code: String,
    pub receiver_profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// How a pair looks from one participant's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerRelation {
    None,
    RequestSent,
    RequestReceived,
    Friends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipStatusView {
    pub relation: PeerRelation,
    pub relationship_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendCountView {
    pub count: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFriendRequestArgs {
    pub target_id: Option<i64>,
    pub connect_code: Option<String>,
}
