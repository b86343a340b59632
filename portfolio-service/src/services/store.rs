//! Persistence seam for contact messages.

use crate::models::{ContactMessage, NewContactMessage};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Insert one message and return the stored row.
    async fn create(&self, input: &NewContactMessage) -> Result<ContactMessage, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

/// In-memory store for tests and database-less local runs.
#[derive(Default)]
pub struct MockContactStore {
    messages: Mutex<Vec<ContactMessage>>,
    fail: AtomicBool,
}

impl MockContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<ContactMessage> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "mock store unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MockContactStore {
    async fn create(&self, input: &NewContactMessage) -> Result<ContactMessage, AppError> {
        self.check()?;

        let mut messages = self
            .messages
            .lock()
            .map_err(|_| AppError::DatabaseError(anyhow::anyhow!("mock store poisoned")))?;

        let message = ContactMessage {
            id: messages.len() as i64 + 1,
            name: input.name.clone(),
            email: input.email.clone(),
            message: input.message.clone(),
            created_at: Utc::now(),
        };
        messages.push(message.clone());

        tracing::info!(message_id = message.id, "[MOCK] Contact message stored");

        Ok(message)
    }

    async fn count(&self) -> Result<i64, AppError> {
        self.check()?;
        Ok(self.messages().len() as i64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }
}
