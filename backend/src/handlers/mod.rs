pub mod alert;
pub mod batch;
pub mod health;
pub mod order_stock;
pub mod receipt;
pub mod stock;
