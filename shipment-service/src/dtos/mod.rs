pub mod shipments;
pub mod users;

pub use shipments::*;
pub use users::*;
