use std::sync::Arc;

use async_trait::async_trait;
use storage::services::settlement::Confirmation;

/// Outbound messages to applicants. Delivery is best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_payment_link(&self, to: &str, url: &str) -> anyhow::Result<()>;

    async fn send_confirmation(&self, confirmation: &Confirmation) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of delivering them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_payment_link(&self, to: &str, url: &str) -> anyhow::Result<()> {
        tracing::info!(%to, %url, "Payment link notification");
        Ok(())
    }

    async fn send_confirmation(&self, confirmation: &Confirmation) -> anyhow::Result<()> {
        tracing::info!(
            to = %confirmation.recipient,
            event = %confirmation.event_title,
            when = %confirmation.event_date_time.to_rfc3339(),
            city = %confirmation.city,
            "Participation confirmation notification"
        );
        Ok(())
    }
}

/// Send the payment link in the background; failures are only logged.
pub fn dispatch_payment_link(notifier: Arc<dyn Notifier>, to: String, url: String) {
    tokio::spawn(async move {
        if let Err(e) = notifier.send_payment_link(&to, &url).await {
            tracing::warn!(%to, "Payment link notification failed: {:#}", e);
        }
    });
}

/// Send the confirmation in the background; failures are only logged.
pub fn dispatch_confirmation(notifier: Arc<dyn Notifier>, confirmation: Confirmation) {
    tokio::spawn(async move {
        if let Err(e) = notifier.send_confirmation(&confirmation).await {
            tracing::warn!(
                to = %confirmation.recipient,
                "Confirmation notification failed: {:#}",
                e
            );
        }
    });
}
