pub mod database;
pub mod metrics;
pub mod notifier;
pub mod providers;
pub mod store;

pub use database::PgContactStore;
pub use metrics::{get_metrics, init_metrics};
pub use notifier::ContactNotifier;
pub use providers::{
    EmailMessage, EmailProvider, GeminiClient, GenerationError, MockEmailProvider, ProviderError,
    SmtpProvider, TextGenerator,
};
pub use store::{ContactStore, MockContactStore};
