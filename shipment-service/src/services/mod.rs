pub mod database;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod operations;
pub mod policy;
pub mod query;
pub mod resolver;
pub mod seed;
pub mod selection;
pub mod store;
pub mod tokens;

pub use database::MongoDb;
pub use error::ResolveError;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics, record_operation};
pub use operations::{execute, OperationRequest};
pub use policy::{authorize, AuthContext, OperationKind};
pub use resolver::Resolver;
pub use store::{ShipmentStore, UserStore};
pub use tokens::TokenService;
