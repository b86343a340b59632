//! The portfolio page and its contact form.

use crate::models::{ContactForm, NewContactMessage};
use crate::services::metrics::record_contact_submission;
use crate::startup::AppState;
use askama::Template;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use service_core::error::AppError;

/// Where the browser lands after submitting the contact form.
pub const CONTACT_REDIRECT: &str = "/#contact";

#[derive(Template)]
#[template(path = "portfolio.html")]
pub struct PortfolioTemplate {
    pub owner_name: String,
    pub year: i32,
}

pub async fn portfolio_page(State(state): State<AppState>) -> impl IntoResponse {
    PortfolioTemplate {
        owner_name: state.config.site.owner_name.clone(),
        year: Utc::now().year(),
    }
}

/// Store the message, try to email the owner, and send the browser back to
/// the contact section.
///
/// Fields the visitor left out are stored empty. A body that cannot be read
/// as a form is a 400. Email trouble never changes the response; storage
/// trouble does.
pub async fn submit_contact(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let form = read_contact_form(request).await.map_err(|e| {
        record_contact_submission("rejected");
        e
    })?;

    let contact = NewContactMessage::from(form);

    tracing::info!(
        name = %contact.name,
        preview = %contact.preview(50),
        "New contact message received"
    );
    tracing::debug!(email = %contact.email, "Contact message sender");

    let stored = match state.store.create(&contact).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!(error = %e, "Failed to store contact message");
            record_contact_submission("error");
            return Err(e);
        }
    };
    record_contact_submission("stored");

    let emailed = state.notifier.notify(&contact).await;
    tracing::info!(message_id = stored.id, emailed, "Contact message processed");

    Ok((StatusCode::FOUND, [(header::LOCATION, CONTACT_REDIRECT)]).into_response())
}

/// Decode a urlencoded or multipart contact form. An empty body is a form
/// with every field missing.
async fn read_contact_form(request: Request) -> Result<ContactForm, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type == "multipart/form-data" {
        return read_multipart_form(request).await;
    }

    let body = Bytes::from_request(request, &()).await?;
    if body.is_empty() {
        return Ok(ContactForm::default());
    }

    if content_type != "application/x-www-form-urlencoded" {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Unsupported contact form content type"
        )));
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid contact form: {}", e)))?;

    Ok(ContactForm::from_pairs(pairs))
}

async fn read_multipart_form(request: Request) -> Result<ContactForm, AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid contact form: {}", e)))?;

    let mut pairs = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        // Uploaded files are not part of the contact form.
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(multipart_error)?;
        pairs.push((name, value));
    }

    Ok(ContactForm::from_pairs(pairs))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body too large".to_string())
    } else {
        AppError::BadRequest(anyhow::anyhow!("Invalid contact form: {}", err.body_text()))
    }
}
