use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

pub type ServiceResult<T> = Result<T, AppError>;
pub type ServiceResponse<T> = ServiceResult<Json<T>>;

#[track_caller]
pub fn unexpected<T, E: Into<anyhow::Error>>(e: E) -> ServiceResult<T> {
    let caller = std::panic::Location::caller();
    error!("An unexpected error has occurred at {caller}: {}", e.into());
    Err(AppError::Unexpected)
}

/// Caller-facing category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Forbidden,
    Conflict,
    InvalidState,
    Unauthorized,
    Internal,
}

#[derive(Debug)]
pub enum AppError {
    Unexpected,
    Unauthorized,
    DecodingRequestFailed,
    InternalServerError(&'static str),

    UsersNotFound,

    RelationshipsNotFound,
    RelationshipsSelfRequest,
    RelationshipsForbidden,
    RelationshipsFriendLimit,
    RelationshipsAlreadyFriends,
    RelationshipsRequestExists,
    RelationshipsNotPending,

    NotificationBlocksSelfTarget,
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    #[track_caller]
    fn from(e: E) -> Self {
        unexpected::<(), E>(e).unwrap_err()
    }
}

impl AppError {
    pub const fn as_str(&self) -> &str {
        self.code()
    }

    pub const fn code(&self) -> &'static str {
        match self {
            AppError::Unexpected => "unexpected",
            AppError::Unauthorized => "unauthorized",
            AppError::DecodingRequestFailed => "decoding_request_failed",
            AppError::InternalServerError(_) => "internal_server_error",

            AppError::UsersNotFound => "users.not_found",

            AppError::RelationshipsNotFound => "relationships.not_found",
            AppError::RelationshipsSelfRequest => "relationships.self_request",
            AppError::RelationshipsForbidden => "relationships.forbidden",
            AppError::RelationshipsFriendLimit => "relationships.friend_limit",
            AppError::RelationshipsAlreadyFriends => "relationships.already_friends",
            AppError::RelationshipsRequestExists => "relationships.request_exists",
            AppError::RelationshipsNotPending => "relationships.not_pending",

            AppError::NotificationBlocksSelfTarget => "notification_blocks.self_target",
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            AppError::Unexpected => "An unexpected error has occurred.",
            AppError::Unauthorized => "You are not authorized to perform this action.",
            AppError::DecodingRequestFailed => "Failed to decode request",
            AppError::InternalServerError(_) => "An internal server error has occurred.",

            AppError::UsersNotFound => "This user does not exist.",

            AppError::RelationshipsNotFound => "Relationship not found",
            AppError::RelationshipsSelfRequest => "You cannot send a friend request to yourself.",
            AppError::RelationshipsForbidden => {
                "You are not allowed to act on this friend request."
            }
            AppError::RelationshipsFriendLimit => "The friend limit has been reached.",
            AppError::RelationshipsAlreadyFriends => "You are already friends with this user.",
            AppError::RelationshipsRequestExists => {
                "A friend request between you and this user is already pending."
            }
            AppError::RelationshipsNotPending => "This friend request is no longer pending.",

            AppError::NotificationBlocksSelfTarget => {
                "You cannot block notifications from yourself."
            }
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            AppError::DecodingRequestFailed
            | AppError::RelationshipsSelfRequest
            | AppError::NotificationBlocksSelfTarget => ErrorKind::InvalidArgument,

            AppError::UsersNotFound | AppError::RelationshipsNotFound => ErrorKind::NotFound,

            AppError::RelationshipsForbidden => ErrorKind::Forbidden,

            AppError::RelationshipsFriendLimit
            | AppError::RelationshipsAlreadyFriends
            | AppError::RelationshipsRequestExists => ErrorKind::Conflict,

            AppError::RelationshipsNotPending => ErrorKind::InvalidState,

            AppError::Unauthorized => ErrorKind::Unauthorized,

            AppError::Unexpected | AppError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    pub const fn http_status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::InvalidState => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn response_parts(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status = self.http_status_code();
        let response = ErrorResponse {
            code: self.code(),
            message: self.message(),
        };
        (status, Json(response))
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.response_parts().into_response()
    }
}
