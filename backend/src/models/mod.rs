//! Database models for the stock & alerting subsystem
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;
