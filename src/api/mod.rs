use crate::adapters::notifications::NotificationDispatcher;
use crate::common::context::Context;
use crate::common::error::AppError;
use crate::common::identity::CallerIdentity;
use crate::common::init;
use crate::common::state::AppState;
use crate::repositories::emotion_records::EmotionActivity;
use crate::repositories::notification_blocks::NotificationBlockStore;
use crate::repositories::relationships::RelationshipStore;
use crate::repositories::users::UserDirectory;
use crate::settings::AppSettings;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub mod v1;

/// Per-request view of the service: shared state plus the authenticated caller.
pub struct RequestContext {
    pub state: AppState,
    pub user_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", v1::router())
}

pub async fn serve(settings: &AppSettings) -> anyhow::Result<()> {
    let state = init::initialize_state(settings).await?;
    let app = router().with_state(state);
    let listener = TcpListener::bind((settings.app_host, settings.app_port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = CallerIdentity::from_request_parts(parts, state).await?;
        Ok(Self {
            state: state.clone(),
            user_id: caller.user_id,
        })
    }
}

impl Context for RequestContext {
    fn relationships(&self) -> &dyn RelationshipStore {
        self.state.relationships()
    }

    fn notification_blocks(&self) -> &dyn NotificationBlockStore {
        self.state.notification_blocks()
    }

    fn users(&self) -> &dyn UserDirectory {
        self.state.users()
    }

    fn emotion_activity(&self) -> &dyn EmotionActivity {
        self.state.emotion_activity()
    }

    fn notifier(&self) -> Arc<dyn NotificationDispatcher> {
        self.state.notifier()
    }
}
