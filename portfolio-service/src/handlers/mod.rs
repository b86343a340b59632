pub mod gemini_proxy;
pub mod health;
pub mod home;

pub use gemini_proxy::gemini_proxy;
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use home::{portfolio_page, submit_contact};
