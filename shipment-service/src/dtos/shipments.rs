use crate::models::{
    generate_shipment_id, generate_tracking_number, Shipment, ShipmentChanges, ShipmentStatus,
};
use crate::services::error::ResolveError;
use crate::services::query::{PageRequest, ShipmentFilter, SortSpec};
use crate::utils::dates::parse_calendar_date;
use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// ISO-8601, millisecond precision, `Z` suffix.
pub fn iso_millis(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentView {
    pub id: String,
    pub shipment_id: String,
    pub shipper_name: String,
    pub carrier_name: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub pickup_date: String,
    pub delivery_date: String,
    pub status: ShipmentStatus,
    pub tracking_number: String,
    pub weight: f64,
    pub rate: f64,
    pub is_flagged: bool,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ShipmentView {
    pub const FIELDS: [&'static str; 16] = [
        "id",
        "shipmentId",
        "shipperName",
        "carrierName",
        "pickupLocation",
        "deliveryLocation",
        "pickupDate",
        "deliveryDate",
        "status",
        "trackingNumber",
        "weight",
        "rate",
        "isFlagged",
        "notes",
        "createdAt",
        "updatedAt",
    ];
}

impl From<Shipment> for ShipmentView {
    fn from(shipment: Shipment) -> Self {
        Self {
            id: shipment.id.to_hex(),
            shipment_id: shipment.shipment_id,
            shipper_name: shipment.shipper_name,
            carrier_name: shipment.carrier_name,
            pickup_location: shipment.pickup_location,
            delivery_location: shipment.delivery_location,
            pickup_date: iso_millis(shipment.pickup_date),
            delivery_date: iso_millis(shipment.delivery_date),
            status: shipment.status,
            tracking_number: shipment.tracking_number,
            weight: shipment.weight,
            rate: shipment.rate,
            is_flagged: shipment.is_flagged,
            notes: shipment.notes,
            created_at: iso_millis(shipment.created_at),
            updated_at: iso_millis(shipment.updated_at),
        }
    }
}

/// One page of shipments. `total_count` ignores pagination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentConnection {
    pub shipments: Vec<ShipmentView>,
    pub total_count: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl ShipmentConnection {
    pub fn new(shipments: Vec<Shipment>, total_count: u64, page: &PageRequest) -> Self {
        let has_next_page = page.has_next_page(shipments.len(), total_count);
        Self {
            shipments: shipments.into_iter().map(ShipmentView::from).collect(),
            total_count,
            has_next_page,
            has_previous_page: page.has_previous_page(),
        }
    }
}

/// Create payload. A caller-supplied `shipmentId` is not part of the input
/// and is dropped during deserialization.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInput {
    #[validate(length(min = 1, message = "shipperName is required"))]
    pub shipper_name: String,
    #[validate(length(min = 1, message = "carrierName is required"))]
    pub carrier_name: String,
    #[validate(length(min = 1, message = "pickupLocation is required"))]
    pub pickup_location: String,
    #[validate(length(min = 1, message = "deliveryLocation is required"))]
    pub delivery_location: String,
    pub pickup_date: String,
    pub delivery_date: String,
    pub status: Option<ShipmentStatus>,
    pub tracking_number: Option<String>,
    #[validate(range(min = 0.0, message = "weight must not be negative"))]
    pub weight: f64,
    #[validate(range(min = 0.0, message = "rate must not be negative"))]
    pub rate: f64,
    pub notes: Option<String>,
}

impl ShipmentInput {
    /// Validates and builds a new record stamped with `now`.
    pub fn into_shipment(self, now: DateTime<Utc>) -> Result<Shipment, ResolveError> {
        self.validate()?;
        let pickup_date = parse_calendar_date("pickupDate", &self.pickup_date)?;
        let delivery_date = parse_calendar_date("deliveryDate", &self.delivery_date)?;

        let tracking_number = self
            .tracking_number
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(generate_tracking_number);

        Ok(Shipment {
            id: ObjectId::new(),
            shipment_id: generate_shipment_id(),
            shipper_name: self.shipper_name,
            carrier_name: self.carrier_name,
            pickup_location: self.pickup_location,
            delivery_location: self.delivery_location,
            pickup_date,
            delivery_date,
            status: self.status.unwrap_or_default(),
            tracking_number,
            weight: self.weight,
            rate: self.rate,
            is_flagged: false,
            notes: self.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update payload. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentUpdateInput {
    #[validate(length(min = 1, message = "shipperName must not be empty"))]
    pub shipper_name: Option<String>,
    #[validate(length(min = 1, message = "carrierName must not be empty"))]
    pub carrier_name: Option<String>,
    #[validate(length(min = 1, message = "pickupLocation must not be empty"))]
    pub pickup_location: Option<String>,
    #[validate(length(min = 1, message = "deliveryLocation must not be empty"))]
    pub delivery_location: Option<String>,
    pub pickup_date: Option<String>,
    pub delivery_date: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub tracking_number: Option<String>,
    #[validate(range(min = 0.0, message = "weight must not be negative"))]
    pub weight: Option<f64>,
    #[validate(range(min = 0.0, message = "rate must not be negative"))]
    pub rate: Option<f64>,
    pub is_flagged: Option<bool>,
    pub notes: Option<String>,
}

impl ShipmentUpdateInput {
    pub fn into_changes(self) -> Result<ShipmentChanges, ResolveError> {
        self.validate()?;
        let pickup_date = self
            .pickup_date
            .map(|raw| parse_calendar_date("pickupDate", &raw))
            .transpose()?;
        let delivery_date = self
            .delivery_date
            .map(|raw| parse_calendar_date("deliveryDate", &raw))
            .transpose()?;

        Ok(ShipmentChanges {
            shipper_name: self.shipper_name,
            carrier_name: self.carrier_name,
            pickup_location: self.pickup_location,
            delivery_location: self.delivery_location,
            pickup_date,
            delivery_date,
            status: self.status,
            tracking_number: self.tracking_number,
            weight: self.weight,
            rate: self.rate,
            is_flagged: self.is_flagged,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentsArgs {
    pub filter: Option<ShipmentFilter>,
    pub sort: Option<SortSpec>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackArgs {
    pub tracking_number: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateArgs {
    pub input: ShipmentInput,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArgs {
    pub id: String,
    pub input: ShipmentUpdateInput,
}

#[derive(Debug, Deserialize)]
pub struct FlagArgs {
    pub id: String,
    pub flagged: bool,
}
