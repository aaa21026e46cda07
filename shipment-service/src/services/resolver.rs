use crate::dtos::{
    AuthPayload, ShipmentConnection, ShipmentInput, ShipmentUpdateInput, ShipmentView, UserView,
};
use crate::models::{Role, ShipmentChanges, User};
use crate::services::error::ResolveError;
use crate::services::policy::AuthContext;
use crate::services::query::{ShipmentFilter, ShipmentQuery, SortSpec};
use crate::services::seed::sample_shipments;
use crate::services::store::{ShipmentStore, UserStore};
use crate::services::tokens::TokenService;
use crate::utils::password::{hash_password, verify_password, Password};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

pub const DEMO_PASSWORD: &str = "demo123";
const DEMO_DOMAIN: &str = "gqlab.com";

/// Executes individual operations against the stores. Callers are expected to
/// have passed [`crate::services::policy::authorize`] already.
#[derive(Clone)]
pub struct Resolver {
    shipments: Arc<dyn ShipmentStore>,
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    max_page_size: i64,
}

fn invalid_credentials() -> ResolveError {
    ResolveError::AuthenticationRequired("Invalid credentials".to_string())
}

impl Resolver {
    pub fn new(
        shipments: Arc<dyn ShipmentStore>,
        users: Arc<dyn UserStore>,
        tokens: TokenService,
        max_page_size: i64,
    ) -> Self {
        Self {
            shipments,
            users,
            tokens,
            max_page_size,
        }
    }

    pub fn shipment_store(&self) -> &Arc<dyn ShipmentStore> {
        &self.shipments
    }

    pub async fn me(&self, ctx: &AuthContext) -> Result<Option<UserView>, ResolveError> {
        let user_id = ctx.user_id().ok_or_else(|| {
            ResolveError::AuthenticationRequired("Authentication required".to_string())
        })?;
        Ok(self.users.find_user(user_id).await?.map(UserView::from))
    }

    pub async fn shipments(
        &self,
        filter: Option<ShipmentFilter>,
        sort: Option<SortSpec>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<ShipmentConnection, ResolveError> {
        let query = ShipmentQuery::build(filter, sort, page, limit, self.max_page_size)?;
        let result = self.shipments.find_shipments(&query).await?;

        tracing::debug!(
            returned = result.shipments.len(),
            total = result.total_count,
            page = query.page.page(),
            "Listed shipments"
        );

        Ok(ShipmentConnection::new(
            result.shipments,
            result.total_count,
            &query.page,
        ))
    }

    /// Unknown or malformed ids resolve to `None`.
    pub async fn shipment(&self, id: &str) -> Result<Option<ShipmentView>, ResolveError> {
        let Ok(id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        Ok(self.shipments.find_shipment(&id).await?.map(ShipmentView::from))
    }

    /// Plain substring match: the term is used verbatim, so `""` matches the
    /// first stored record and surrounding whitespace is significant.
    pub async fn track_shipment(&self, term: &str) -> Result<Option<ShipmentView>, ResolveError> {
        Ok(self
            .shipments
            .find_tracked_shipment(term)
            .await?
            .map(ShipmentView::from))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ResolveError> {
        let user = self
            .users
            .find_user_by_email(email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&Password::new(password), &user.password_hash) {
            tracing::info!(user_id = %user.id, "Login rejected");
            return Err(invalid_credentials());
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        self.session(user)
    }

    pub async fn demo_login(&self, role: &str) -> Result<AuthPayload, ResolveError> {
        let role: Role = role
            .parse()
            .map_err(|_| ResolveError::validation(format!("Invalid demo role '{}'", role)))?;
        let email = format!("{}@{}", role, DEMO_DOMAIN);

        let user = match self.users.find_user_by_email(&email).await? {
            Some(existing) => existing,
            None => {
                let name = match role {
                    Role::Admin => "Admin User",
                    Role::Employee => "Employee User",
                };
                let password_hash = hash_password(&Password::new(DEMO_PASSWORD))
                    .map_err(|e| ResolveError::Internal(e.to_string()))?;
                let created = self
                    .users
                    .find_or_create_user(User::new(email, name.to_string(), role, password_hash))
                    .await?;
                tracing::info!(user_id = %created.id, role = %role, "Demo account ready");
                created
            }
        };

        self.session(user)
    }

    pub async fn create_shipment(&self, input: ShipmentInput) -> Result<ShipmentView, ResolveError> {
        let shipment = input.into_shipment(Utc::now())?;
        self.shipments.insert_shipment(&shipment).await?;

        tracing::info!(
            id = %shipment.id,
            shipment_id = %shipment.shipment_id,
            "Shipment created"
        );
        Ok(ShipmentView::from(shipment))
    }

    pub async fn update_shipment(
        &self,
        id: &str,
        input: ShipmentUpdateInput,
    ) -> Result<ShipmentView, ResolveError> {
        let changes = input.into_changes()?;
        let id = ObjectId::parse_str(id).map_err(|_| ResolveError::shipment_not_found())?;
        let updated = self.apply_changes(&id, &changes).await?;

        tracing::info!(id = %id, shipment_id = %updated.shipment_id, "Shipment updated");
        Ok(updated)
    }

    /// `false` when nothing was stored under `id`.
    pub async fn delete_shipment(&self, id: &str) -> Result<bool, ResolveError> {
        let Ok(id) = ObjectId::parse_str(id) else {
            return Ok(false);
        };
        let deleted = self.shipments.delete_shipment(&id).await?;
        tracing::info!(id = %id, deleted, "Shipment delete requested");
        Ok(deleted)
    }

    pub async fn flag_shipment(&self, id: &str, flagged: bool) -> Result<ShipmentView, ResolveError> {
        let id = ObjectId::parse_str(id).map_err(|_| ResolveError::shipment_not_found())?;
        let updated = self.apply_changes(&id, &ShipmentChanges::flag(flagged)).await?;

        tracing::info!(id = %id, flagged, "Shipment flag set");
        Ok(updated)
    }

    /// Loads the sample dataset into an empty collection. A non-empty
    /// collection is left as is.
    pub async fn seed_data(&self) -> Result<bool, ResolveError> {
        let existing = self.shipments.count_shipments().await?;
        if existing > 0 {
            tracing::info!(existing, "Seed skipped, shipments already present");
            return Ok(true);
        }

        let samples = sample_shipments(Utc::now())?;
        self.shipments.insert_shipments(&samples).await?;
        tracing::info!(inserted = samples.len(), "Seeded sample shipments");
        Ok(true)
    }

    async fn apply_changes(
        &self,
        id: &ObjectId,
        changes: &ShipmentChanges,
    ) -> Result<ShipmentView, ResolveError> {
        self.shipments
            .update_shipment(id, changes, Utc::now())
            .await?
            .map(ShipmentView::from)
            .ok_or_else(ResolveError::shipment_not_found)
    }

    fn session(&self, user: User) -> Result<AuthPayload, ResolveError> {
        let token = self.tokens.issue(&user)?;
        Ok(AuthPayload {
            token,
            user: UserView::from(user),
        })
    }
}
