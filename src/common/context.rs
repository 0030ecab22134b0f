use crate::adapters::notifications::NotificationDispatcher;
use crate::repositories::emotion_records::EmotionActivity;
use crate::repositories::notification_blocks::NotificationBlockStore;
use crate::repositories::relationships::RelationshipStore;
use crate::repositories::users::UserDirectory;
use std::sync::Arc;

pub trait Context: Sync + Send {
    fn relationships(&self) -> &dyn RelationshipStore;
    fn notification_blocks(&self) -> &dyn NotificationBlockStore;
    fn users(&self) -> &dyn UserDirectory;
    fn emotion_activity(&self) -> &dyn EmotionActivity;
    /// Owned handle, so delivery can outlive the request.
    fn notifier(&self) -> Arc<dyn NotificationDispatcher>;
}
