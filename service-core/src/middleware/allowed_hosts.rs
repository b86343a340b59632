//! Reject requests whose `Host` header is not one we serve.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Host allow-list.
///
/// An empty list or a `*` entry allows everything. An entry starting with `.`
/// matches that domain and all of its subdomains.
#[derive(Debug, Clone, Default)]
pub struct AllowedHosts {
    patterns: Vec<String>,
}

impl AllowedHosts {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a comma separated list such as `localhost,.example.com`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn allows_any(&self) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p == "*")
    }

    /// Check a raw `Host` header value (port is ignored).
    pub fn is_allowed(&self, host: &str) -> bool {
        if self.allows_any() {
            return true;
        }

        let host = strip_port(host).to_ascii_lowercase();
        let host = host.trim_end_matches('.');

        self.patterns.iter().any(|pattern| match pattern.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(pattern.as_str()),
            None => host == pattern,
        })
    }
}

fn strip_port(host: &str) -> &str {
    // [::1]:8080 keeps its brackets, host:port loses the port
    if let Some(end) = host.find(']') {
        return &host[..=end];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

pub async fn allowed_hosts_middleware(
    State(allowed): State<Arc<AllowedHosts>>,
    req: Request,
    next: Next,
) -> Response {
    if allowed.allows_any() {
        return next.run(req).await;
    }

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default()
        .to_string();

    if !allowed.is_allowed(&host) {
        tracing::warn!(host = %host, "Rejected request for disallowed host");
        return AppError::BadRequest(anyhow::anyhow!("Invalid Host header")).into_response();
    }

    next.run(req).await
}
