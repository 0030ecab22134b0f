use crate::common::context::Context;
use crate::models::notifications::Notification;
use std::time::Duration;
use tracing::{debug, info, warn};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands `notification` to the dispatcher in the background.
///
/// Nothing here can fail the caller: a recipient who blocked the sender is
/// skipped, and delivery errors or timeouts are only logged.
pub async fn dispatch<C: Context>(ctx: &C, notification: Notification) {
    let recipient_id = notification.recipient_id;
    let sender_id = notification.sender_id;
    match ctx
        .notification_blocks()
        .exists(recipient_id, sender_id)
        .await
    {
        Ok(true) => {
            debug!(
                recipient_id,
                sender_id, "Recipient blocked notifications from sender, skipping"
            );
            return;
        }
        Ok(false) => {}
        Err(e) => warn!(
            recipient_id,
            sender_id, "Failed to check notification block, delivering anyway: {e}"
        ),
    }

    let notifier = ctx.notifier();
    tokio::spawn(async move {
        let kind = notification.kind;
        match tokio::time::timeout(DELIVERY_TIMEOUT, notifier.notify(&notification)).await {
            Ok(Ok(())) => info!(recipient_id, sender_id, ?kind, "Delivered notification"),
            Ok(Err(e)) => warn!(
                recipient_id,
                sender_id,
                ?kind,
                "Failed to deliver notification: {e:?}"
            ),
            Err(_) => warn!(
                recipient_id,
                sender_id,
                ?kind,
                "Timed out delivering notification"
            ),
        }
    });
}
