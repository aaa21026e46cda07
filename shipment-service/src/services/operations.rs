//! Single entry point for named operations.
//!
//! A request names an operation, supplies its arguments as a JSON object and
//! optionally selects record fields. [`execute`] authorizes the caller, parses
//! the arguments into an [`OperationCall`], runs it and shapes the output.

use crate::dtos::{
    AuthPayload, CreateArgs, DemoLoginArgs, FlagArgs, IdArgs, LoginArgs, ShipmentConnection,
    ShipmentView, ShipmentsArgs, TrackArgs, UpdateArgs, UserView,
};
use crate::services::error::ResolveError;
use crate::services::metrics::record_operation;
use crate::services::policy::{authorize, AuthContext, OperationKind};
use crate::services::resolver::Resolver;
use crate::services::selection::{FieldSelection, RecordKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;

#[derive(Debug, Clone, Deserialize)]
pub struct OperationRequest {
    pub operation: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub enum OperationCall {
    Me,
    Shipments(ShipmentsArgs),
    Shipment(IdArgs),
    TrackShipment(TrackArgs),
    Login(LoginArgs),
    DemoLogin(DemoLoginArgs),
    CreateShipment(CreateArgs),
    UpdateShipment(UpdateArgs),
    DeleteShipment(IdArgs),
    FlagShipment(FlagArgs),
    SeedData,
}

fn arguments<T: DeserializeOwned>(kind: OperationKind, value: Value) -> Result<T, ResolveError> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value).map_err(|e| {
        ResolveError::validation(format!("Invalid arguments for {}: {}", kind, e))
    })
}

impl OperationCall {
    pub fn parse(kind: OperationKind, value: Value) -> Result<Self, ResolveError> {
        Ok(match kind {
            OperationKind::Me => OperationCall::Me,
            OperationKind::SeedData => OperationCall::SeedData,
            OperationKind::Shipments => OperationCall::Shipments(arguments(kind, value)?),
            OperationKind::Shipment => OperationCall::Shipment(arguments(kind, value)?),
            OperationKind::TrackShipment => OperationCall::TrackShipment(arguments(kind, value)?),
            OperationKind::Login => OperationCall::Login(arguments(kind, value)?),
            OperationKind::DemoLogin => OperationCall::DemoLogin(arguments(kind, value)?),
            OperationKind::CreateShipment => {
                OperationCall::CreateShipment(arguments(kind, value)?)
            }
            OperationKind::UpdateShipment => {
                OperationCall::UpdateShipment(arguments(kind, value)?)
            }
            OperationKind::DeleteShipment => {
                OperationCall::DeleteShipment(arguments(kind, value)?)
            }
            OperationKind::FlagShipment => OperationCall::FlagShipment(arguments(kind, value)?),
        })
    }
}

/// Typed result of one operation, before field selection.
#[derive(Debug)]
pub enum OperationOutput {
    User(Option<UserView>),
    Shipment(Option<ShipmentView>),
    Connection(ShipmentConnection),
    Session(AuthPayload),
    Flag(bool),
}

impl OperationOutput {
    pub fn render(self, selection: &FieldSelection) -> Result<Value, ResolveError> {
        let render = |value: Result<Value, serde_json::Error>| {
            value.map_err(|e| ResolveError::Internal(format!("Failed to render result: {}", e)))
        };

        Ok(match self {
            OperationOutput::User(user) => selection.project(render(serde_json::to_value(user))?),
            OperationOutput::Shipment(shipment) => {
                selection.project(render(serde_json::to_value(shipment))?)
            }
            OperationOutput::Connection(connection) => {
                let mut value = render(serde_json::to_value(connection))?;
                if let Some(shipments) = value.get_mut("shipments") {
                    *shipments = selection.project_all(shipments.take());
                }
                value
            }
            OperationOutput::Session(payload) => {
                let mut value = render(serde_json::to_value(payload))?;
                if let Some(user) = value.get_mut("user") {
                    *user = selection.project(user.take());
                }
                value
            }
            OperationOutput::Flag(flag) => Value::Bool(flag),
        })
    }
}

pub async fn resolve(
    resolver: &Resolver,
    ctx: &AuthContext,
    call: OperationCall,
) -> Result<OperationOutput, ResolveError> {
    Ok(match call {
        OperationCall::Me => OperationOutput::User(resolver.me(ctx).await?),
        OperationCall::Shipments(args) => OperationOutput::Connection(
            resolver
                .shipments(args.filter, args.sort, args.page, args.limit)
                .await?,
        ),
        OperationCall::Shipment(args) => OperationOutput::Shipment(resolver.shipment(&args.id).await?),
        OperationCall::TrackShipment(args) => {
            OperationOutput::Shipment(resolver.track_shipment(&args.tracking_number).await?)
        }
        OperationCall::Login(args) => {
            OperationOutput::Session(resolver.login(&args.email, &args.password).await?)
        }
        OperationCall::DemoLogin(args) => {
            OperationOutput::Session(resolver.demo_login(&args.role).await?)
        }
        OperationCall::CreateShipment(args) => {
            OperationOutput::Shipment(Some(resolver.create_shipment(args.input).await?))
        }
        OperationCall::UpdateShipment(args) => OperationOutput::Shipment(Some(
            resolver.update_shipment(&args.id, args.input).await?,
        )),
        OperationCall::DeleteShipment(args) => {
            OperationOutput::Flag(resolver.delete_shipment(&args.id).await?)
        }
        OperationCall::FlagShipment(args) => OperationOutput::Shipment(Some(
            resolver.flag_shipment(&args.id, args.flagged).await?,
        )),
        OperationCall::SeedData => OperationOutput::Flag(resolver.seed_data().await?),
    })
}

/// Authorize, parse, resolve and shape one request.
#[tracing::instrument(
    name = "operation",
    skip_all,
    fields(operation = %request.operation, authenticated = ctx.is_identified())
)]
pub async fn execute(
    resolver: &Resolver,
    ctx: &AuthContext,
    request: OperationRequest,
) -> Result<Value, ResolveError> {
    let start = Instant::now();
    let kind = match OperationKind::from_name(&request.operation) {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!("Rejected unknown operation");
            return Err(e);
        }
    };

    let result = run(resolver, ctx, kind, request).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    record_operation(kind.name(), outcome);

    match &result {
        Ok(_) => tracing::info!(
            outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Operation resolved"
        ),
        Err(e) => tracing::warn!(
            outcome,
            error = %e,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Operation failed"
        ),
    }

    result
}

async fn run(
    resolver: &Resolver,
    ctx: &AuthContext,
    kind: OperationKind,
    request: OperationRequest,
) -> Result<Value, ResolveError> {
    authorize(ctx, kind)?;
    let selection = FieldSelection::parse(RecordKind::of(kind), request.fields)?;
    let call = OperationCall::parse(kind, request.arguments)?;
    resolve(resolver, ctx, call).await?.render(&selection)
}
