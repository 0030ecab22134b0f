pub mod notification_blocks;
pub mod relationships;
pub mod users;
