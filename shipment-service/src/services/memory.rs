use crate::models::{Shipment, ShipmentChanges, User};
use crate::services::error::ResolveError;
use crate::services::query::{matches_tracking, ShipmentPage, ShipmentQuery};
use crate::services::store::{ShipmentStore, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

/// Process-local store used for development and tests. Records are kept in
/// insertion order so equal sort keys resolve the same way on every call.
#[derive(Default)]
pub struct MemoryStore {
    shipments: RwLock<Vec<Shipment>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_shipment(shipment_id: &str) -> ResolveError {
    ResolveError::Conflict(format!("Shipment {} already exists", shipment_id))
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn ping(&self) -> Result<(), ResolveError> {
        Ok(())
    }

    async fn insert_shipment(&self, shipment: &Shipment) -> Result<(), ResolveError> {
        let mut shipments = self.shipments.write().await;
        if shipments
            .iter()
            .any(|s| s.id == shipment.id || s.shipment_id == shipment.shipment_id)
        {
            return Err(duplicate_shipment(&shipment.shipment_id));
        }
        shipments.push(shipment.clone());
        Ok(())
    }

    async fn insert_shipments(&self, batch: &[Shipment]) -> Result<(), ResolveError> {
        let mut shipments = self.shipments.write().await;
        for (i, shipment) in batch.iter().enumerate() {
            let taken = shipments
                .iter()
                .chain(&batch[..i])
                .any(|s| s.id == shipment.id || s.shipment_id == shipment.shipment_id);
            if taken {
                return Err(duplicate_shipment(&shipment.shipment_id));
            }
        }
        shipments.extend_from_slice(batch);
        Ok(())
    }

    async fn count_shipments(&self) -> Result<u64, ResolveError> {
        Ok(self.shipments.read().await.len() as u64)
    }

    async fn find_shipment(&self, id: &ObjectId) -> Result<Option<Shipment>, ResolveError> {
        let shipments = self.shipments.read().await;
        Ok(shipments.iter().find(|s| &s.id == id).cloned())
    }

    async fn find_shipments(&self, query: &ShipmentQuery) -> Result<ShipmentPage, ResolveError> {
        let shipments = self.shipments.read().await;
        let (shipments, total_count) = query.evaluate(shipments.iter());
        Ok(ShipmentPage {
            shipments,
            total_count,
        })
    }

    async fn find_tracked_shipment(&self, term: &str) -> Result<Option<Shipment>, ResolveError> {
        let shipments = self.shipments.read().await;
        Ok(shipments
            .iter()
            .find(|s| matches_tracking(term, s))
            .cloned())
    }

    async fn update_shipment(
        &self,
        id: &ObjectId,
        changes: &ShipmentChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Shipment>, ResolveError> {
        let mut shipments = self.shipments.write().await;
        Ok(shipments.iter_mut().find(|s| &s.id == id).map(|shipment| {
            changes.apply(shipment, now);
            shipment.clone()
        }))
    }

    async fn delete_shipment(&self, id: &ObjectId) -> Result<bool, ResolveError> {
        let mut shipments = self.shipments.write().await;
        let before = shipments.len();
        shipments.retain(|s| &s.id != id);
        Ok(shipments.len() < before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: &ObjectId) -> Result<Option<User>, ResolveError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ResolveError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_or_create_user(&self, user: User) -> Result<User, ResolveError> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.iter().find(|u| u.email == user.email) {
            return Ok(existing.clone());
        }
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ShipmentStatus, Role};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn shipment(shipment_id: &str, tracking: &str) -> Shipment {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        Shipment {
            id: ObjectId::new(),
            shipment_id: shipment_id.to_string(),
            shipper_name: "Acme Corp".to_string(),
            carrier_name: "UPS".to_string(),
            pickup_location: "Chicago, IL".to_string(),
            delivery_location: "Miami, FL".to_string(),
            pickup_date: at,
            delivery_date: at,
            status: ShipmentStatus::Pending,
            tracking_number: tracking.to_string(),
            weight: 10.0,
            rate: 20.0,
            is_flagged: false,
            notes: String::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_business_id_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .insert_shipment(&shipment("SHP-1", "TRK1"))
            .await
            .unwrap();

        let result = store.insert_shipment(&shipment("SHP-1", "TRK2")).await;
        assert!(matches!(result, Err(ResolveError::Conflict(_))));
        assert_eq!(store.count_shipments().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let store = MemoryStore::new();
        let batch = vec![shipment("SHP-1", "TRK1"), shipment("SHP-1", "TRK2")];

        assert!(store.insert_shipments(&batch).await.is_err());
        assert_eq!(store.count_shipments().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_returns_post_update_record() {
        let store = MemoryStore::new();
        let original = shipment("SHP-1", "TRK1");
        store.insert_shipment(&original).await.unwrap();

        let now = Utc::now();
        let updated = store
            .update_shipment(&original.id, &ShipmentChanges::flag(true), now)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_flagged);
        assert_eq!(updated.updated_at, now);

        let missing = store
            .update_shipment(&ObjectId::new(), &ShipmentChanges::flag(true), now)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_whether_a_record_existed() {
        let store = MemoryStore::new();
        let original = shipment("SHP-1", "TRK1");
        store.insert_shipment(&original).await.unwrap();

        assert!(store.delete_shipment(&original.id).await.unwrap());
        assert!(!store.delete_shipment(&original.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_tracking_lookup_returns_first_match() {
        let store = MemoryStore::new();
        store
            .insert_shipment(&shipment("SHP-A", "TRK123456"))
            .await
            .unwrap();

        let found = store.find_tracked_shipment("trk123").await.unwrap();
        assert_eq!(found.unwrap().shipment_id, "SHP-A");
        assert!(store.find_tracked_shipment("TRK999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_yields_one_account() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let user = User::new(
                    "admin@gqlab.com".to_string(),
                    "Admin User".to_string(),
                    Role::Admin,
                    "hash".to_string(),
                );
                store.find_or_create_user(user).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.users.read().await.len(), 1);
    }
}
