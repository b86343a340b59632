//! Contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored contact form submission.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Contact form body as posted by the browser.
///
/// Every field is optional: a visitor who leaves a box empty (or a client that
/// omits it) still gets their message stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactForm {
    /// Build from decoded form fields. A repeated field keeps its last value;
    /// unknown fields are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = Some(value),
                "email" => form.email = Some(value),
                "message" => form.message = Some(value),
                _ => {}
            }
        }
        form
    }
}

/// Insert shape for a contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl From<ContactForm> for NewContactMessage {
    fn from(form: ContactForm) -> Self {
        Self {
            name: form.name.unwrap_or_default(),
            email: form.email.unwrap_or_default(),
            message: form.message.unwrap_or_default(),
        }
    }
}

impl NewContactMessage {
    /// First `max_chars` characters of the message, for logs.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.message.chars().take(max_chars).collect();
        if self.message.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}
