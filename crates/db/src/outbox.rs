//! Bounded notification outbox.
//!
//! The engines only decide that a notification should go out. This
//! dispatcher validates the channels and queues the payload for whatever
//! drains the receiving end.

use async_trait::async_trait;
use ledgerline_core::alerts::DispatchRequest;
use ledgerline_core::store::{DispatchError, NotificationDispatcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Channels the delivery system understands.
pub const SUPPORTED_CHANNELS: &[&str] = &["email", "sms", "slack", "webhook", "in_app"];

/// [`NotificationDispatcher`] backed by a bounded channel.
#[derive(Debug, Clone)]
pub struct OutboxDispatcher {
    sender: mpsc::Sender<DispatchRequest>,
}

impl OutboxDispatcher {
    /// Creates an outbox holding at most `capacity` undelivered notifications.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DispatchRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationDispatcher for OutboxDispatcher {
    async fn enqueue(&self, request: DispatchRequest) -> Result<(), DispatchError> {
        if let Some(unknown) = request
            .channels
            .iter()
            .find(|c| !SUPPORTED_CHANNELS.contains(&c.as_str()))
        {
            return Err(DispatchError::Rejected(format!("unknown channel {unknown}")));
        }

        let event_id = request.event_id;
        match self.sender.try_send(request) {
            Ok(()) => {
                debug!(event_id = %event_id, "notification queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(DispatchError::Unavailable("outbox is full".into())),
            Err(TrySendError::Closed(_)) => {
                Err(DispatchError::Unavailable("outbox is closed".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_shared::types::{AlertEventId, TenantId};
    use rstest::rstest;

    fn request(channels: &[&str]) -> DispatchRequest {
        DispatchRequest {
            tenant_id: TenantId::new(),
            event_id: AlertEventId::new(),
            channels: channels.iter().map(ToString::to_string).collect(),
            subject: "Alert: Low cash".into(),
            message: "Low cash: balance of Cash & Bank is 900".into(),
        }
    }

    #[tokio::test]
    async fn test_queues_and_delivers() {
        let (outbox, mut rx) = OutboxDispatcher::channel(4);
        let req = request(&["email", "slack"]);
        outbox.enqueue(req.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(req));
    }

    #[rstest]
    #[case(&["email", "pager"], "pager")]
    #[case(&["fax"], "fax")]
    #[case(&["in_app", "Slack"], "Slack")]
    #[tokio::test]
    async fn test_unknown_channel_rejected(#[case] channels: &[&str], #[case] unknown: &str) {
        let (outbox, mut rx) = OutboxDispatcher::channel(4);
        let err = outbox.enqueue(request(channels)).await.unwrap_err();
        assert_eq!(err, DispatchError::Rejected(format!("unknown channel {unknown}")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_and_closed_are_unavailable() {
        let (outbox, rx) = OutboxDispatcher::channel(1);
        outbox.enqueue(request(&["email"])).await.unwrap();
        assert!(matches!(
            outbox.enqueue(request(&["email"])).await,
            Err(DispatchError::Unavailable(_))
        ));

        drop(rx);
        assert_eq!(
            outbox.enqueue(request(&["email"])).await.unwrap_err(),
            DispatchError::Unavailable("outbox is closed".into())
        );
    }
}
