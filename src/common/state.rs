use crate::adapters::notifications::NotificationDispatcher;
use crate::common::context::Context;
use crate::repositories::emotion_records::EmotionActivity;
use crate::repositories::notification_blocks::NotificationBlockStore;
use crate::repositories::relationships::RelationshipStore;
use crate::repositories::users::UserDirectory;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub relationships: Arc<dyn RelationshipStore>,
    pub notification_blocks: Arc<dyn NotificationBlockStore>,
    pub users: Arc<dyn UserDirectory>,
    pub emotion_activity: Arc<dyn EmotionActivity>,
    pub notifier: Arc<dyn NotificationDispatcher>,
}

impl Context for AppState {
    fn relationships(&self) -> &dyn RelationshipStore {
        self.relationships.as_ref()
    }

    fn notification_blocks(&self) -> &dyn NotificationBlockStore {
        self.notification_blocks.as_ref()
    }

    fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    fn emotion_activity(&self) -> &dyn EmotionActivity {
        self.emotion_activity.as_ref()
    }

    fn notifier(&self) -> Arc<dyn NotificationDispatcher> {
        self.notifier.clone()
    }
}
