//! admin-core: Shared infrastructure for the campsite admin services.
pub mod error;
pub mod localized;
pub mod observability;

pub use axum;
pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
