use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub connect_code: String,
    #[sqlx(default)]
    pub profile_image_url: Option<String>,
}
