//! Typed shipment query specification.
//!
//! Filters, sort and pagination arrive as closed types and are compiled into a
//! [`ShipmentQuery`], which renders the MongoDB filter/sort documents and also
//! evaluates the same predicate in memory. Only fields named by these types can
//! ever reach the store.

use crate::models::{fields, Shipment, ShipmentStatus};
use crate::services::error::ResolveError;
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Fields the free-text `search` term is matched against.
const SEARCH_FIELDS: [&str; 6] = [
    fields::SHIPPER_NAME,
    fields::CARRIER_NAME,
    fields::SHIPMENT_ID,
    fields::TRACKING_NUMBER,
    fields::PICKUP_LOCATION,
    fields::DELIVERY_LOCATION,
];

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShipmentFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<ShipmentStatus>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub shipper_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub carrier_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
}

/// Treats `""` the same as an absent value.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

impl ShipmentFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();

        if let Some(status) = self.status {
            filter.insert(fields::STATUS, status.as_str());
        }
        if let Some(shipper) = &self.shipper_name {
            filter.insert(fields::SHIPPER_NAME, contains_ignore_case(shipper));
        }
        if let Some(carrier) = &self.carrier_name {
            filter.insert(fields::CARRIER_NAME, contains_ignore_case(carrier));
        }
        if let Some(search) = &self.search {
            let alternatives: Vec<Bson> = SEARCH_FIELDS
                .iter()
                .map(|field| Bson::Document(single(field, contains_ignore_case(search))))
                .collect();
            filter.insert("$or", alternatives);
        }

        filter
    }

    pub fn matches(&self, shipment: &Shipment) -> bool {
        if let Some(status) = self.status {
            if shipment.status != status {
                return false;
            }
        }
        if let Some(shipper) = &self.shipper_name {
            if !contains_folded(&shipment.shipper_name, shipper) {
                return false;
            }
        }
        if let Some(carrier) = &self.carrier_name {
            if !contains_folded(&shipment.carrier_name, carrier) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let searchable = [
                &shipment.shipper_name,
                &shipment.carrier_name,
                &shipment.shipment_id,
                &shipment.tracking_number,
                &shipment.pickup_location,
                &shipment.delivery_location,
            ];
            if !searchable.iter().any(|value| contains_folded(value, search)) {
                return false;
            }
        }
        true
    }
}

/// Filter for `trackShipment`: tracking number OR business id contains `term`.
pub fn tracking_filter(term: &str) -> Document {
    let alternatives = vec![
        Bson::Document(single(fields::TRACKING_NUMBER, contains_ignore_case(term))),
        Bson::Document(single(fields::SHIPMENT_ID, contains_ignore_case(term))),
    ];
    doc! { "$or": alternatives }
}

pub fn matches_tracking(term: &str, shipment: &Shipment) -> bool {
    contains_folded(&shipment.tracking_number, term) || contains_folded(&shipment.shipment_id, term)
}

fn contains_ignore_case(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}

fn single(key: &str, value: impl Into<Bson>) -> Document {
    let mut document = Document::new();
    document.insert(key, value);
    document
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    ShipmentId,
    ShipperName,
    CarrierName,
    PickupLocation,
    DeliveryLocation,
    PickupDate,
    DeliveryDate,
    Status,
    TrackingNumber,
    Weight,
    Rate,
    IsFlagged,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn storage_field(&self) -> &'static str {
        match self {
            SortField::ShipmentId => fields::SHIPMENT_ID,
            SortField::ShipperName => fields::SHIPPER_NAME,
            SortField::CarrierName => fields::CARRIER_NAME,
            SortField::PickupLocation => fields::PICKUP_LOCATION,
            SortField::DeliveryLocation => fields::DELIVERY_LOCATION,
            SortField::PickupDate => fields::PICKUP_DATE,
            SortField::DeliveryDate => fields::DELIVERY_DATE,
            SortField::Status => fields::STATUS,
            SortField::TrackingNumber => fields::TRACKING_NUMBER,
            SortField::Weight => fields::WEIGHT,
            SortField::Rate => fields::RATE,
            SortField::IsFlagged => fields::IS_FLAGGED,
            SortField::CreatedAt => fields::CREATED_AT,
            SortField::UpdatedAt => fields::UPDATED_AT,
        }
    }

    fn compare(&self, a: &Shipment, b: &Shipment) -> Ordering {
        match self {
            SortField::ShipmentId => a.shipment_id.cmp(&b.shipment_id),
            SortField::ShipperName => a.shipper_name.cmp(&b.shipper_name),
            SortField::CarrierName => a.carrier_name.cmp(&b.carrier_name),
            SortField::PickupLocation => a.pickup_location.cmp(&b.pickup_location),
            SortField::DeliveryLocation => a.delivery_location.cmp(&b.delivery_location),
            SortField::PickupDate => a.pickup_date.cmp(&b.pickup_date),
            SortField::DeliveryDate => a.delivery_date.cmp(&b.delivery_date),
            // Stored as strings, so the store orders them lexically.
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::TrackingNumber => a.tracking_number.cmp(&b.tracking_number),
            SortField::Weight => a.weight.total_cmp(&b.weight),
            SortField::Rate => a.rate.total_cmp(&b.rate),
            SortField::IsFlagged => a.is_flagged.cmp(&b.is_flagged),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl SortSpec {
    pub fn to_document(&self) -> Document {
        let direction = match self.order {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };
        single(self.field.storage_field(), direction)
    }

    /// Single-key ordering; equal keys compare `Equal` and keep natural order.
    pub fn compare(&self, a: &Shipment, b: &Shipment) -> Ordering {
        let ordering = self.field.compare(a, b);
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// 1-indexed page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    pub fn new(
        page: Option<i64>,
        limit: Option<i64>,
        max_page_size: i64,
    ) -> Result<Self, ResolveError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(ResolveError::validation(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        if limit < 1 {
            return Err(ResolveError::validation(format!(
                "limit must be greater than 0, got {}",
                limit
            )));
        }
        if limit > max_page_size {
            return Err(ResolveError::validation(format!(
                "limit must not exceed {}, got {}",
                max_page_size, limit
            )));
        }
        // Keeps (page - 1) * limit inside i64 for the store.
        if (page - 1).checked_mul(limit).is_none() {
            return Err(ResolveError::validation("page is out of range"));
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        ((self.page - 1) * self.limit) as u64
    }

    pub fn has_next_page(&self, returned: usize, total: u64) -> bool {
        self.offset() + (returned as u64) < total
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentQuery {
    pub filter: ShipmentFilter,
    pub sort: SortSpec,
    pub page: PageRequest,
}

impl ShipmentQuery {
    pub fn build(
        filter: Option<ShipmentFilter>,
        sort: Option<SortSpec>,
        page: Option<i64>,
        limit: Option<i64>,
        max_page_size: i64,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            filter: filter.unwrap_or_default(),
            sort: sort.unwrap_or_default(),
            page: PageRequest::new(page, limit, max_page_size)?,
        })
    }

    pub fn filter_document(&self) -> Document {
        self.filter.to_document()
    }

    pub fn sort_document(&self) -> Document {
        self.sort.to_document()
    }

    /// Applies filter, sort and window to an in-memory collection.
    /// Returns the page together with the unpaginated match count.
    pub fn evaluate<'a, I>(&self, shipments: I) -> (Vec<Shipment>, u64)
    where
        I: IntoIterator<Item = &'a Shipment>,
    {
        let mut matched: Vec<&Shipment> = shipments
            .into_iter()
            .filter(|s| self.filter.matches(s))
            .collect();
        let total = matched.len() as u64;

        // stable: ties keep insertion order
        matched.sort_by(|a, b| self.sort.compare(a, b));

        let page = matched
            .into_iter()
            .skip(self.page.offset() as usize)
            .take(self.page.limit() as usize)
            .cloned()
            .collect();

        (page, total)
    }
}

/// One window of results plus the total number of matches.
#[derive(Debug, Clone)]
pub struct ShipmentPage {
    pub shipments: Vec<Shipment>,
    pub total_count: u64,
}
