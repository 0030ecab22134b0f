pub mod context;
pub mod env;
pub mod error;
pub mod identity;
pub mod init;
pub mod redis_pool;
pub mod state;
