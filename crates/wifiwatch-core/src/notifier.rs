//! Notifier
//!
//! Sends texts through a [`MessageTransport`] and classifies the outcome.
//! A delivery counts as successful when the transport answered with a
//! status below 400.

use crate::traits::{MessageTransport, RecipientId, ReplyKeyboard};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a single delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Whether the message was accepted
    pub ok: bool,
    /// Transport status, if the transport answered at all
    pub status: Option<u16>,
}

impl DeliveryResult {
    fn from_status(status: u16) -> Self {
        Self {
            ok: status < 400,
            status: Some(status),
        }
    }

    fn unreachable() -> Self {
        Self {
            ok: false,
            status: None,
        }
    }
}

/// Delivers messages to recipients
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MessageTransport>,
}

impl Notifier {
    /// Create a notifier over a transport
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self { transport }
    }

    /// Send one message and log the outcome
    pub async fn notify(
        &self,
        recipient: &RecipientId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> DeliveryResult {
        let result = match self.transport.send_message(recipient, text, keyboard).await {
            Ok(status) => DeliveryResult::from_status(status),
            Err(e) => {
                warn!("Delivery to {} via {} failed: {}", recipient, self.transport.transport_name(), e);
                return DeliveryResult::unreachable();
            }
        };

        if result.ok {
            info!("Message \"{}\" delivered to {}", text, recipient);
        } else {
            warn!("Delivery to {} rejected with status {:?}", recipient, result.status);
        }

        result
    }

    /// Send the same message to every recipient, one after another
    ///
    /// A failure for one recipient does not stop delivery to the rest.
    pub async fn notify_all(
        &self,
        recipients: &[RecipientId],
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Vec<DeliveryResult> {
        let mut results = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            results.push(self.notify(recipient, text, keyboard).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::InboundUpdate;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Answers 403 for chat "blocked", fails outright for "offline"
    struct StatusTransport;

    #[async_trait]
    impl MessageTransport for StatusTransport {
        async fn send_message(
            &self,
            chat_id: &RecipientId,
            _text: &str,
            _keyboard: Option<&ReplyKeyboard>,
        ) -> crate::Result<u16> {
            match chat_id.as_str() {
                "blocked" => Ok(403),
                "offline" => Err(crate::Error::transport("connection refused")),
                _ => Ok(200),
            }
        }

        async fn get_updates(&self, _offset: i64, _timeout: Duration) -> crate::Result<Vec<InboundUpdate>> {
            Ok(Vec::new())
        }

        fn transport_name(&self) -> &'static str {
            "status"
        }
    }

    #[tokio::test]
    async fn status_below_400_is_success() {
        let notifier = Notifier::new(Arc::new(StatusTransport));

        let result = notifier.notify(&"u1".into(), "hello", None).await;
        assert_eq!(result, DeliveryResult { ok: true, status: Some(200) });

        let result = notifier.notify(&"blocked".into(), "hello", None).await;
        assert_eq!(result, DeliveryResult { ok: false, status: Some(403) });
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_rest() {
        let notifier = Notifier::new(Arc::new(StatusTransport));
        let recipients: Vec<RecipientId> = vec!["offline".into(), "blocked".into(), "u2".into()];

        let results = notifier.notify_all(&recipients, "hello", None).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], DeliveryResult { ok: false, status: None });
        assert!(!results[1].ok);
        assert!(results[2].ok);
    }
}
