use diary_friends_service::api;
use diary_friends_service::common::init;
use diary_friends_service::settings::AppSettings;
use diary_friends_service::workers::crons;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::get();
    init::initialize_logging(settings);
    match settings.app_component.as_str() {
        "api" => api::serve(settings).await,
        "cleanup-cron" => crons::cleanup_cron::serve(settings).await,
        component => anyhow::bail!("Unknown app component: {component}"),
    }
}
