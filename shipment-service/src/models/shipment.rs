use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage document field names.
pub mod fields {
    pub const ID: &str = "_id";
    pub const SHIPMENT_ID: &str = "shipment_id";
    pub const SHIPPER_NAME: &str = "shipper_name";
    pub const CARRIER_NAME: &str = "carrier_name";
    pub const PICKUP_LOCATION: &str = "pickup_location";
    pub const DELIVERY_LOCATION: &str = "delivery_location";
    pub const PICKUP_DATE: &str = "pickup_date";
    pub const DELIVERY_DATE: &str = "delivery_date";
    pub const STATUS: &str = "status";
    pub const TRACKING_NUMBER: &str = "tracking_number";
    pub const WEIGHT: &str = "weight";
    pub const RATE: &str = "rate";
    pub const IS_FLAGGED: &str = "is_flagged";
    pub const NOTES: &str = "notes";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
    Cancelled,
    Delayed,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in-transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
            ShipmentStatus::Delayed => "delayed",
        }
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShipmentStatus::Pending),
            "in-transit" => Ok(ShipmentStatus::InTransit),
            "delivered" => Ok(ShipmentStatus::Delivered),
            "cancelled" => Ok(ShipmentStatus::Cancelled),
            "delayed" => Ok(ShipmentStatus::Delayed),
            _ => Err(format!("unknown shipment status '{}'", s)),
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shipment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub shipment_id: String,
    pub shipper_name: String,
    pub carrier_name: String,
    pub pickup_location: String,
    pub delivery_location: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub pickup_date: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub delivery_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ShipmentStatus,
    pub tracking_number: String,
    pub weight: f64,
    pub rate: f64,
    #[serde(default)]
    pub is_flagged: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentChanges {
    pub shipper_name: Option<String>,
    pub carrier_name: Option<String>,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub status: Option<ShipmentStatus>,
    pub tracking_number: Option<String>,
    pub weight: Option<f64>,
    pub rate: Option<f64>,
    pub is_flagged: Option<bool>,
    pub notes: Option<String>,
}

impl ShipmentChanges {
    pub fn flag(flagged: bool) -> Self {
        Self {
            is_flagged: Some(flagged),
            ..Self::default()
        }
    }

    /// `$set` body for the store, always stamping `updated_at`.
    pub fn to_set_document(&self, now: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        let mut put = |key: &str, value: Option<Bson>| {
            if let Some(value) = value {
                set.insert(key, value);
            }
        };

        put(fields::SHIPPER_NAME, self.shipper_name.clone().map(Bson::String));
        put(fields::CARRIER_NAME, self.carrier_name.clone().map(Bson::String));
        put(fields::PICKUP_LOCATION, self.pickup_location.clone().map(Bson::String));
        put(
            fields::DELIVERY_LOCATION,
            self.delivery_location.clone().map(Bson::String),
        );
        put(fields::PICKUP_DATE, self.pickup_date.map(bson_date));
        put(fields::DELIVERY_DATE, self.delivery_date.map(bson_date));
        put(
            fields::STATUS,
            self.status.map(|s| Bson::String(s.as_str().to_string())),
        );
        put(fields::TRACKING_NUMBER, self.tracking_number.clone().map(Bson::String));
        put(fields::WEIGHT, self.weight.map(Bson::Double));
        put(fields::RATE, self.rate.map(Bson::Double));
        put(fields::IS_FLAGGED, self.is_flagged.map(Bson::Boolean));
        put(fields::NOTES, self.notes.clone().map(Bson::String));
        put(fields::UPDATED_AT, Some(bson_date(now)));

        doc! { "$set": set }
    }

    /// In-place equivalent of [`Self::to_set_document`].
    pub fn apply(&self, shipment: &mut Shipment, now: DateTime<Utc>) {
        if let Some(v) = &self.shipper_name {
            shipment.shipper_name = v.clone();
        }
        if let Some(v) = &self.carrier_name {
            shipment.carrier_name = v.clone();
        }
        if let Some(v) = &self.pickup_location {
            shipment.pickup_location = v.clone();
        }
        if let Some(v) = &self.delivery_location {
            shipment.delivery_location = v.clone();
        }
        if let Some(v) = self.pickup_date {
            shipment.pickup_date = v;
        }
        if let Some(v) = self.delivery_date {
            shipment.delivery_date = v;
        }
        if let Some(v) = self.status {
            shipment.status = v;
        }
        if let Some(v) = &self.tracking_number {
            shipment.tracking_number = v.clone();
        }
        if let Some(v) = self.weight {
            shipment.weight = v;
        }
        if let Some(v) = self.rate {
            shipment.rate = v;
        }
        if let Some(v) = self.is_flagged {
            shipment.is_flagged = v;
        }
        if let Some(v) = &self.notes {
            shipment.notes = v.clone();
        }
        shipment.updated_at = now;
    }
}

fn bson_date(value: DateTime<Utc>) -> Bson {
    Bson::DateTime(mongodb::bson::DateTime::from_chrono(value))
}

/// Business identifier: `SHP-` followed by 12 upper-case hex digits.
pub fn generate_shipment_id() -> String {
    format!("SHP-{}", random_token(12))
}

pub fn generate_tracking_number() -> String {
    format!("TRK{}", random_token(12))
}

fn random_token(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_uppercase()
}
