use crate::models::{Shipment, ShipmentChanges, User};
use crate::services::error::ResolveError;
use crate::services::query::{tracking_filter, ShipmentPage, ShipmentQuery};
use crate::services::store::{ShipmentStore, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

/// Process-wide MongoDB handle. Acquired once by `Application::build` and
/// released by [`MongoDb::shutdown`].
#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for shipment-service");

        let shipment_id_index = IndexModel::builder()
            .keys(doc! { "shipment_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("shipment_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("status_created_lookup".to_string())
                    .build(),
            )
            .build();

        let created_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_lookup".to_string())
                    .build(),
            )
            .build();

        self.shipments()
            .create_indexes([shipment_id_index, status_index, created_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on shipments collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created indexes on shipments.(shipment_id, status, created_at)");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.users()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index on users collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on users.email");

        Ok(())
    }

    /// Closes pooled connections. Call once the HTTP server has drained.
    pub async fn shutdown(self) {
        tracing::info!("Closing MongoDB connections");
        self.client.shutdown().await;
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn shipments(&self) -> Collection<Shipment> {
        self.db.collection("shipments")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}

#[async_trait]
impl ShipmentStore for MongoDb {
    async fn ping(&self) -> Result<(), ResolveError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    async fn insert_shipment(&self, shipment: &Shipment) -> Result<(), ResolveError> {
        self.shipments().insert_one(shipment, None).await?;
        Ok(())
    }

    async fn insert_shipments(&self, shipments: &[Shipment]) -> Result<(), ResolveError> {
        if shipments.is_empty() {
            return Ok(());
        }
        self.shipments().insert_many(shipments, None).await?;
        Ok(())
    }

    async fn count_shipments(&self) -> Result<u64, ResolveError> {
        Ok(self.shipments().count_documents(None, None).await?)
    }

    async fn find_shipment(&self, id: &ObjectId) -> Result<Option<Shipment>, ResolveError> {
        Ok(self
            .shipments()
            .find_one(doc! { "_id": *id }, None)
            .await?)
    }

    async fn find_shipments(&self, query: &ShipmentQuery) -> Result<ShipmentPage, ResolveError> {
        let filter = query.filter_document();

        let total_count = self
            .shipments()
            .count_documents(filter.clone(), None)
            .await?;

        let options = FindOptions::builder()
            .sort(query.sort_document())
            .skip(query.page.offset())
            .limit(query.page.limit())
            .build();

        let cursor = self.shipments().find(filter, options).await?;
        let shipments: Vec<Shipment> = cursor.try_collect().await?;

        Ok(ShipmentPage {
            shipments,
            total_count,
        })
    }

    async fn find_tracked_shipment(&self, term: &str) -> Result<Option<Shipment>, ResolveError> {
        Ok(self
            .shipments()
            .find_one(tracking_filter(term), None)
            .await?)
    }

    async fn update_shipment(
        &self,
        id: &ObjectId,
        changes: &ShipmentChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Shipment>, ResolveError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .shipments()
            .find_one_and_update(doc! { "_id": *id }, changes.to_set_document(now), options)
            .await?)
    }

    async fn delete_shipment(&self, id: &ObjectId) -> Result<bool, ResolveError> {
        let result = self
            .shipments()
            .delete_one(doc! { "_id": *id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl UserStore for MongoDb {
    async fn find_user(&self, id: &ObjectId) -> Result<Option<User>, ResolveError> {
        Ok(self.users().find_one(doc! { "_id": *id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ResolveError> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_or_create_user(&self, user: User) -> Result<User, ResolveError> {
        let email = user.email.clone();
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let mut insert = mongodb::bson::to_document(&user)?;
        // Supplied by the equality filter on upsert
        insert.remove("email");

        match self
            .users()
            .find_one_and_update(
                doc! { "email": email.as_str() },
                doc! { "$setOnInsert": insert },
                options,
            )
            .await
        {
            Ok(Some(stored)) => Ok(stored),
            Ok(None) => Err(ResolveError::Internal(format!(
                "upsert for {} returned no document",
                email
            ))),
            Err(e) => match ResolveError::from(e) {
                // Lost an insert race to a concurrent caller; theirs is stored.
                ResolveError::Conflict(_) => self
                    .find_user_by_email(&email)
                    .await?
                    .ok_or_else(|| ResolveError::Conflict(format!("User {} conflicts", email))),
                other => Err(other),
            },
        }
    }
}
