pub mod tasks;

use crate::common::init;
use crate::cron_tasks;
use crate::settings::AppSettings;
use tasks::purge_relationship_history::purge_relationship_history;

pub async fn serve(settings: &AppSettings) -> anyhow::Result<()> {
    let ctx = init::initialize_state(settings).await?;
    let failed_tasks = cron_tasks! {
        &ctx,
        purge_relationship_history,
    };
    if failed_tasks > 0 {
        anyhow::bail!("{failed_tasks} cleanup task(s) failed");
    }
    Ok(())
}
