use crate::common::context::Context;
use crate::common::error::ServiceResult;
use crate::settings::AppSettings;
use crate::usecases::relationships;
use tracing::info;

/// Drops rejected and cancelled relationships older than the configured retention.
pub async fn purge_relationship_history<C: Context>(ctx: &C) -> ServiceResult<u64> {
    let retention = AppSettings::get().relationship_history_retention;
    let purged = relationships::purge_history(ctx, retention).await?;
    if purged > 0 {
        info!(purged, retention_days = retention.num_days(), "Purged relationship history");
    }
    Ok(purged)
}
