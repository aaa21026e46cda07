//! Runs the MongoDB adapter against a live server, one database per test.
//! Set `MONGODB_URI` to point somewhere other than localhost. When no server
//! answers, each test logs and returns early.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use shipment_service::dtos::ShipmentInput;
use shipment_service::models::{Role, Shipment, ShipmentChanges, ShipmentStatus, User};
use shipment_service::services::query::{ShipmentFilter, ShipmentQuery};
use shipment_service::services::{
    MongoDb, ResolveError, Resolver, ShipmentStore, TokenService, UserStore,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

struct TestDb {
    db: MongoDb,
}

impl TestDb {
    async fn connect() -> Option<Self> {
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017/?serverSelectionTimeoutMS=2000".to_string());
        let name = format!("shipment_test_{}", Uuid::new_v4().simple());

        let db = MongoDb::connect(&uri, &name).await.ok()?;
        if db.ping().await.is_err() {
            eprintln!("MongoDB not reachable at {}, skipping", uri);
            return None;
        }
        db.initialize_indexes()
            .await
            .expect("Failed to initialize indexes");
        Some(Self { db })
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(
            Arc::new(self.db.clone()),
            Arc::new(self.db.clone()),
            TokenService::from_secret("test-secret", 7),
            100,
        )
    }

    async fn cleanup(self) {
        let _ = self.db.database().drop(None).await;
        self.db.shutdown().await;
    }
}

fn shipment(shipper: &str, status: &str, hours: i64) -> Shipment {
    let input: ShipmentInput = serde_json::from_value(json!({
        "shipperName": shipper,
        "carrierName": "FedEx",
        "pickupLocation": "New York, NY",
        "deliveryLocation": "Los Angeles, CA",
        "pickupDate": "2024-01-15",
        "deliveryDate": "2024-01-20",
        "status": status,
        "weight": 150.0,
        "rate": 450.0
    }))
    .unwrap();

    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours);
    let mut shipment = input.into_shipment(created).unwrap();
    shipment.created_at = created;
    shipment.updated_at = created;
    shipment
}

#[tokio::test]
async fn pending_filter_paginates_with_accurate_counts() {
    let Some(test) = TestDb::connect().await else {
        return;
    };
    let batch = vec![
        shipment("P1", "pending", 1),
        shipment("D1", "delivered", 2),
        shipment("P2", "pending", 3),
        shipment("P3", "pending", 4),
        shipment("D2", "delivered", 5),
        shipment("P4", "pending", 6),
    ];
    test.db.insert_shipments(&batch).await.unwrap();

    let pending = ShipmentFilter {
        status: Some(ShipmentStatus::Pending),
        ..ShipmentFilter::default()
    };

    let first = ShipmentQuery::build(Some(pending.clone()), None, Some(1), Some(2), 100).unwrap();
    let page = test.db.find_shipments(&first).await.unwrap();
    assert_eq!(page.total_count, 4);
    let names: Vec<_> = page.shipments.iter().map(|s| s.shipper_name.as_str()).collect();
    assert_eq!(names, vec!["P4", "P3"]);

    let second = ShipmentQuery::build(Some(pending.clone()), None, Some(2), Some(2), 100).unwrap();
    let page = test.db.find_shipments(&second).await.unwrap();
    assert_eq!(page.total_count, 4);
    let names: Vec<_> = page.shipments.iter().map(|s| s.shipper_name.as_str()).collect();
    assert_eq!(names, vec!["P2", "P1"]);

    let beyond = ShipmentQuery::build(Some(pending), None, Some(3), Some(2), 100).unwrap();
    let page = test.db.find_shipments(&beyond).await.unwrap();
    assert_eq!(page.total_count, 4);
    assert!(page.shipments.is_empty());

    test.cleanup().await;
}

#[tokio::test]
async fn duplicate_business_ids_conflict() {
    let Some(test) = TestDb::connect().await else {
        return;
    };
    let original = shipment("Acme", "pending", 1);
    test.db.insert_shipment(&original).await.unwrap();

    let mut copy = shipment("Acme Copy", "pending", 2);
    copy.shipment_id = original.shipment_id.clone();
    assert!(matches!(
        test.db.insert_shipment(&copy).await,
        Err(ResolveError::Conflict(_))
    ));

    let fresh = shipment("Fresh", "pending", 3);
    let mut clash = shipment("Clash", "pending", 4);
    clash.shipment_id = fresh.shipment_id.clone();
    assert!(matches!(
        test.db.insert_shipments(&[fresh, clash]).await,
        Err(ResolveError::Conflict(_))
    ));

    test.cleanup().await;
}

#[tokio::test]
async fn updates_return_the_stored_post_image() {
    let Some(test) = TestDb::connect().await else {
        return;
    };
    let stored = shipment("Acme", "pending", 1);
    test.db.insert_shipment(&stored).await.unwrap();

    let now = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
    let flagged = test
        .db
        .update_shipment(&stored.id, &ShipmentChanges::flag(true), now)
        .await
        .unwrap()
        .expect("shipment should exist");
    assert!(flagged.is_flagged);
    assert_eq!(flagged.updated_at, now);
    assert_eq!(flagged.shipper_name, "Acme");

    let changes = ShipmentChanges {
        status: Some(ShipmentStatus::InTransit),
        notes: Some("Left the depot".to_string()),
        ..ShipmentChanges::default()
    };
    let updated = test
        .db
        .update_shipment(&stored.id, &changes, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, ShipmentStatus::InTransit);
    assert_eq!(updated.notes, "Left the depot");
    assert!(updated.is_flagged);
    assert_eq!(updated.created_at, stored.created_at);

    let missing = test
        .db
        .update_shipment(&mongodb::bson::oid::ObjectId::new(), &changes, now)
        .await
        .unwrap();
    assert!(missing.is_none());

    test.cleanup().await;
}

#[tokio::test]
async fn tracking_lookup_uses_the_raw_term() {
    let Some(test) = TestDb::connect().await else {
        return;
    };
    let stored = shipment("Acme", "pending", 1);
    test.db.insert_shipment(&stored).await.unwrap();

    let found = test
        .db
        .find_tracked_shipment(&stored.tracking_number.to_lowercase())
        .await
        .unwrap();
    assert_eq!(found.map(|s| s.id), Some(stored.id));

    assert!(test.db.find_tracked_shipment("").await.unwrap().is_some());
    let padded = format!("{} ", stored.tracking_number);
    assert!(test.db.find_tracked_shipment(&padded).await.unwrap().is_none());
    assert!(test.db.find_tracked_shipment("TRK.*").await.unwrap().is_none());

    test.cleanup().await;
}

#[tokio::test]
async fn find_or_create_keeps_the_first_user() {
    let Some(test) = TestDb::connect().await else {
        return;
    };
    let first = User::new(
        "admin@gqlab.com".to_string(),
        "Admin User".to_string(),
        Role::Admin,
        "hash-one".to_string(),
    );
    let second = User::new(
        "admin@gqlab.com".to_string(),
        "Someone Else".to_string(),
        Role::Admin,
        "hash-two".to_string(),
    );

    let created = test.db.find_or_create_user(first.clone()).await.unwrap();
    assert_eq!(created.id, first.id);
    assert_eq!(created.email, "admin@gqlab.com");

    let existing = test.db.find_or_create_user(second).await.unwrap();
    assert_eq!(existing.id, first.id);
    assert_eq!(existing.name, "Admin User");
    assert_eq!(existing.password_hash, "hash-one");

    test.cleanup().await;
}

#[tokio::test]
async fn concurrent_demo_logins_share_one_account() {
    let Some(test) = TestDb::connect().await else {
        return;
    };
    let resolver = test.resolver();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            resolver.demo_login("employee").await.unwrap()
        }));
    }

    let mut user_ids = HashSet::new();
    for handle in handles {
        let payload = handle.await.unwrap();
        assert_eq!(payload.user.email, "employee@gqlab.com");
        user_ids.insert(payload.user.id);
    }
    assert_eq!(user_ids.len(), 1);

    let session = resolver
        .login("employee@gqlab.com", "demo123")
        .await
        .unwrap();
    assert!(user_ids.contains(&session.user.id));

    test.cleanup().await;
}
