//! Shared types and models for the Pharmacy Retail Platform
//!
//! This crate contains types shared between the backend and other
//! surfaces of the system (admin back office, storefront).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
