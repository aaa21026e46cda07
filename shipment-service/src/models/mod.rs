pub mod shipment;
pub mod user;

pub use shipment::{
    fields, generate_shipment_id, generate_tracking_number, Shipment, ShipmentChanges,
    ShipmentStatus,
};
pub use user::{Role, User};
