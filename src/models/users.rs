use crate::entities::users::User as UserEntity;

/// Display attributes of a user as resolved by the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: i64,
    pub nickname: String,
    pub connect_code: String,
    pub profile_image_url: Option<String>,
}

impl From<UserEntity> for UserProfile {
    fn from(value: UserEntity) -> Self {
        Self {
            user_id: value.id,
            nickname: value.nickname,
            connect_code: value.connect_code,
            profile_image_url: value.profile_image_url,
        }
    }
}
