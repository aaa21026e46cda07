//! Persistence boundary for shipments and users.

use crate::models::{Shipment, ShipmentChanges, User};
use crate::services::error::ResolveError;
use crate::services::query::{ShipmentPage, ShipmentQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), ResolveError>;

    /// Fails with `Conflict` when `shipment_id` is already taken.
    async fn insert_shipment(&self, shipment: &Shipment) -> Result<(), ResolveError>;

    async fn insert_shipments(&self, shipments: &[Shipment]) -> Result<(), ResolveError>;

    async fn count_shipments(&self) -> Result<u64, ResolveError>;

    async fn find_shipment(&self, id: &ObjectId) -> Result<Option<Shipment>, ResolveError>;

    async fn find_shipments(&self, query: &ShipmentQuery) -> Result<ShipmentPage, ResolveError>;

    /// First shipment whose tracking number or business id contains `term`.
    async fn find_tracked_shipment(&self, term: &str) -> Result<Option<Shipment>, ResolveError>;

    /// Atomic find-and-update returning the post-update record, or `None`
    /// when no record has this id.
    async fn update_shipment(
        &self,
        id: &ObjectId,
        changes: &ShipmentChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Shipment>, ResolveError>;

    /// Returns whether a record was actually removed.
    async fn delete_shipment(&self, id: &ObjectId) -> Result<bool, ResolveError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &ObjectId) -> Result<Option<User>, ResolveError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ResolveError>;

    /// Returns the account stored under `user.email`, inserting `user` first
    /// if none exists. Atomic with respect to concurrent callers.
    async fn find_or_create_user(&self, user: User) -> Result<User, ResolveError>;
}
