use crate::common::error::{AppError, ServiceResult};
use crate::entities::relationships::Relationship as RelationshipEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RelationshipStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Pending => "PENDING",
            RelationshipStatus::Accepted => "ACCEPTED",
            RelationshipStatus::Rejected => "REJECTED",
            RelationshipStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal rows are kept as history until the next request for the pair.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            RelationshipStatus::Rejected | RelationshipStatus::Cancelled
        )
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relationship status {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for RelationshipStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RelationshipStatus::Pending),
            "ACCEPTED" => Ok(RelationshipStatus::Accepted),
            "REJECTED" => Ok(RelationshipStatus::Rejected),
            "CANCELLED" => Ok(RelationshipStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

/// Two distinct users in canonical `(low, high)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserPair {
    low: i64,
    high: i64,
}

impl UserPair {
    /// Returns `None` when both ids are the same user.
    pub fn new(a: i64, b: i64) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub const fn low(&self) -> i64 {
        self.low
    }

    pub const fn high(&self) -> i64 {
        self.high
    }

    pub const fn contains(&self, user_id: i64) -> bool {
        self.low == user_id || self.high == user_id
    }

    pub const fn other(&self, user_id: i64) -> Option<i64> {
        if user_id == self.low {
            Some(self.high)
        } else if user_id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub relationship_id: i64,
    pub user_low: i64,
    pub user_high: i64,
    // The participant that sent the request
    pub requester_id: i64,
    pub status: RelationshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    pub const fn pair(&self) -> UserPair {
        UserPair {
            low: self.user_low,
            high: self.user_high,
        }
    }

    pub const fn receiver_id(&self) -> i64 {
        if self.requester_id == self.user_low {
            self.user_high
        } else {
            self.user_low
        }
    }

    pub const fn is_requester(&self, user_id: i64) -> bool {
        self.requester_id == user_id
    }

    pub const fn is_receiver(&self, user_id: i64) -> bool {
        self.pair().contains(user_id) && !self.is_requester(user_id)
    }

    pub const fn other_participant(&self, user_id: i64) -> Option<i64> {
        self.pair().other(user_id)
    }

    /// Applies a status change. Only `PENDING` relationships may move, and only
    /// to one of the three outcomes of a request.
    pub fn transition(&mut self, to: RelationshipStatus, at: DateTime<Utc>) -> ServiceResult<()> {
        if self.status != RelationshipStatus::Pending {
            return Err(AppError::RelationshipsNotPending);
        }
        if to == RelationshipStatus::Pending {
            return Err(AppError::InternalServerError(
                "relationship cannot transition back to pending",
            ));
        }
        self.status = to;
        self.updated_at = at;
        Ok(())
    }
}

impl TryFrom<RelationshipEntity> for Relationship {
    type Error = UnknownStatus;

    fn try_from(value: RelationshipEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            relationship_id: value.id,
            user_low: value.user_low,
            user_high: value.user_high,
            requester_id: value.requester_id,
            status: value.status.parse()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// A request about to be inserted; the store assigns the id.
#[derive(Debug, Clone, Copy)]
pub struct NewRelationship {
    pub pair: UserPair,
    pub requester_id: i64,
    pub created_at: DateTime<Utc>,
}

impl NewRelationship {
    pub fn into_relationship(self, relationship_id: i64) -> Relationship {
        Relationship {
            relationship_id,
            user_low: self.pair.low(),
            user_high: self.pair.high(),
            requester_id: self.requester_id,
            status: RelationshipStatus::Pending,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
