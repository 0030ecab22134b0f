pub mod friends;
pub mod notification_blocks;
pub mod notifications;
pub mod relationships;
pub mod users;
