mod decimal_text;

pub mod expense_category;
pub mod product_cost_price;
pub mod shared_cost;
pub mod shared_cost_allocation;
pub mod shipment;
pub mod shipment_item;

pub use decimal_text::DecimalText;
pub use shipment::{CalculationMethod, ShipmentStatus};
