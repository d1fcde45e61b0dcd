//! Delivery transport is outside this system; the server's notifier
//! writes the assembled message to the log where the mail relay picks
//! its feed up.

use d8tl_core::notify::{Notifier, OutboundMessage};

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn deliver(&self, message: &OutboundMessage) {
        tracing::info!(
            template = %message.template,
            to = ?message.to,
            cc = ?message.cc,
            bcc = ?message.bcc,
            subject = %message.subject,
            "notification ready for delivery"
        );
    }
}

/// Collects messages instead of delivering them. Used by tests.
#[derive(Default)]
pub struct CollectingNotifier {
    pub messages: std::sync::Mutex<Vec<OutboundMessage>>,
}

impl Notifier for CollectingNotifier {
    fn deliver(&self, message: &OutboundMessage) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
    }
}
