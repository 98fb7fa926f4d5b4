//! Domain models for the Pharmacy Retail Platform

mod alert;
mod stock;

pub use alert::*;
pub use stock::*;
