//! Owner notification for new contact messages.

use crate::models::NewContactMessage;
use crate::services::metrics::record_contact_email;
use crate::services::providers::{EmailMessage, EmailProvider, ProviderError};
use std::sync::Arc;

#[derive(Clone)]
pub struct ContactNotifier {
    provider: Arc<dyn EmailProvider>,
    recipient: String,
}

impl ContactNotifier {
    pub fn new(provider: Arc<dyn EmailProvider>, recipient: impl Into<String>) -> Self {
        Self {
            provider,
            recipient: recipient.into(),
        }
    }

    pub fn compose(&self, contact: &NewContactMessage) -> EmailMessage {
        let display_name = if contact.name.is_empty() {
            "someone"
        } else {
            contact.name.as_str()
        };

        EmailMessage {
            to: self.recipient.clone(),
            subject: format!("New portfolio message from {}", display_name),
            body_text: format!(
                "Name: {}\nEmail: {}\n\nMessage:\n{}\n",
                contact.name, contact.email, contact.message
            ),
            reply_to: Some(contact.email.clone()).filter(|e| !e.is_empty()),
        }
    }

    /// Reachability of the underlying email provider.
    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.provider.health_check().await
    }

    /// Send the notification. Failures are logged and reported as `false`,
    /// never returned to the caller.
    pub async fn notify(&self, contact: &NewContactMessage) -> bool {
        if self.recipient.is_empty() {
            tracing::warn!("No contact recipient configured; skipping notification email");
            record_contact_email("skipped");
            return false;
        }

        let email = self.compose(contact);
        match self.provider.send(&email).await {
            Ok(_) => {
                record_contact_email("sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send contact notification email");
                record_contact_email("failed");
                false
            }
        }
    }
}
