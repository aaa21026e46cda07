//! Central authorization guard.
//!
//! Every operation the dispatcher knows about is listed in [`OperationKind`]
//! and carries exactly one [`Requirement`]. [`authorize`] is evaluated once per
//! request, before any argument parsing or store access.

use crate::models::Role;
use crate::services::error::ResolveError;
use mongodb::bson::oid::ObjectId;

/// Caller identity derived from the bearer credential of one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Identified {
        user_id: ObjectId,
        email: String,
        role: Role,
    },
}

impl AuthContext {
    pub fn is_identified(&self) -> bool {
        matches!(self, AuthContext::Identified { .. })
    }

    pub fn user_id(&self) -> Option<&ObjectId> {
        match self {
            AuthContext::Identified { user_id, .. } => Some(user_id),
            AuthContext::Anonymous => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Open,
    Identified,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Me,
    Shipments,
    Shipment,
    TrackShipment,
    Login,
    DemoLogin,
    CreateShipment,
    UpdateShipment,
    DeleteShipment,
    FlagShipment,
    SeedData,
}

impl OperationKind {
    pub const ALL: [OperationKind; 11] = [
        OperationKind::Me,
        OperationKind::Shipments,
        OperationKind::Shipment,
        OperationKind::TrackShipment,
        OperationKind::Login,
        OperationKind::DemoLogin,
        OperationKind::CreateShipment,
        OperationKind::UpdateShipment,
        OperationKind::DeleteShipment,
        OperationKind::FlagShipment,
        OperationKind::SeedData,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Me => "me",
            OperationKind::Shipments => "shipments",
            OperationKind::Shipment => "shipment",
            OperationKind::TrackShipment => "trackShipment",
            OperationKind::Login => "login",
            OperationKind::DemoLogin => "demoLogin",
            OperationKind::CreateShipment => "createShipment",
            OperationKind::UpdateShipment => "updateShipment",
            OperationKind::DeleteShipment => "deleteShipment",
            OperationKind::FlagShipment => "flagShipment",
            OperationKind::SeedData => "seedData",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ResolveError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ResolveError::validation(format!("Unknown operation '{}'", name)))
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            OperationKind::Login | OperationKind::DemoLogin | OperationKind::SeedData => {
                Requirement::Open
            }
            OperationKind::CreateShipment
            | OperationKind::UpdateShipment
            | OperationKind::DeleteShipment => Requirement::Admin,
            OperationKind::Me
            | OperationKind::Shipments
            | OperationKind::Shipment
            | OperationKind::TrackShipment
            | OperationKind::FlagShipment => Requirement::Identified,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn authorize(ctx: &AuthContext, kind: OperationKind) -> Result<(), ResolveError> {
    match (kind.requirement(), ctx) {
        (Requirement::Open, _) => Ok(()),
        (_, AuthContext::Anonymous) => Err(ResolveError::AuthenticationRequired(
            "Authentication required".to_string(),
        )),
        (Requirement::Identified, AuthContext::Identified { .. }) => Ok(()),
        (Requirement::Admin, AuthContext::Identified { role: Role::Admin, .. }) => Ok(()),
        (Requirement::Admin, AuthContext::Identified { .. }) => Err(
            ResolveError::AuthorizationDenied("Admin access required".to_string()),
        ),
    }
}
