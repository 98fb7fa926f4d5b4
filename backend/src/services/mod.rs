pub mod alert;
pub mod batch;
pub mod order_stock;
pub mod receipt;
pub mod stock;

pub use alert::AlertService;
pub use batch::BatchService;
pub use order_stock::OrderStockService;
pub use receipt::GoodsReceiptService;
pub use stock::StockService;
