//! Portfolio Service - personal site with a contact form and a Gemini proxy.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
