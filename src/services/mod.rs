// Pure allocation engine
pub mod landed_cost;

// Shipment lifecycle
pub mod shipments;

// Collaborators owned by other parts of the system
pub mod expense_categories;
pub mod product_costs;
