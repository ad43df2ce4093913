//! Notification dispatcher that writes to the tracing log
//!
//! Stands in for a real delivery channel (mail, push) in the CLI and in
//! single-process setups.

use async_trait::async_trait;
use ballot_application::{Notification, NotificationDispatcher, NotificationError};
use tracing::info;

pub struct TracingNotifier;

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            "Notify {} [{}]: {}",
            notification.recipient,
            notification.kind.as_str(),
            notification.message
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_application::NotificationKind;
    use ballot_domain::UserId;

    #[tokio::test]
    async fn test_notify_never_fails() {
        let notification = Notification::new(
            UserId::new("alice"),
            NotificationKind::PositionAssigned,
            "You are now treasurer",
        );
        assert!(TracingNotifier.notify(notification).await.is_ok());
    }
}
