//! Demonstration dataset loaded by `seedData`.

use crate::models::{generate_shipment_id, generate_tracking_number, Shipment, ShipmentStatus};
use crate::services::error::ResolveError;
use crate::utils::dates::parse_calendar_date;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

struct Sample {
    shipper: &'static str,
    carrier: &'static str,
    pickup: &'static str,
    delivery: &'static str,
    pickup_date: &'static str,
    delivery_date: &'static str,
    status: ShipmentStatus,
    weight: f64,
    rate: f64,
    notes: &'static str,
}

const SAMPLES: [Sample; 12] = [
    Sample {
        shipper: "Acme Corp",
        carrier: "FedEx",
        pickup: "New York, NY",
        delivery: "Los Angeles, CA",
        pickup_date: "2024-01-15",
        delivery_date: "2024-01-20",
        status: ShipmentStatus::Delivered,
        weight: 150.0,
        rate: 450.0,
        notes: "Fragile electronics",
    },
    Sample {
        shipper: "Global Tech",
        carrier: "UPS",
        pickup: "Chicago, IL",
        delivery: "Miami, FL",
        pickup_date: "2024-01-18",
        delivery_date: "2024-01-23",
        status: ShipmentStatus::InTransit,
        weight: 200.0,
        rate: 520.0,
        notes: "Machine parts",
    },
    Sample {
        shipper: "FastMove Inc",
        carrier: "DHL",
        pickup: "Seattle, WA",
        delivery: "Boston, MA",
        pickup_date: "2024-01-20",
        delivery_date: "2024-01-26",
        status: ShipmentStatus::Pending,
        weight: 75.0,
        rate: 280.0,
        notes: "Medical supplies",
    },
    Sample {
        shipper: "Prime Logistics",
        carrier: "FedEx",
        pickup: "Dallas, TX",
        delivery: "Phoenix, AZ",
        pickup_date: "2024-01-22",
        delivery_date: "2024-01-25",
        status: ShipmentStatus::InTransit,
        weight: 320.0,
        rate: 680.0,
        notes: "Auto parts",
    },
    Sample {
        shipper: "QuickShip Co",
        carrier: "USPS",
        pickup: "Denver, CO",
        delivery: "Atlanta, GA",
        pickup_date: "2024-01-25",
        delivery_date: "2024-01-30",
        status: ShipmentStatus::Pending,
        weight: 45.0,
        rate: 120.0,
        notes: "Documents",
    },
    Sample {
        shipper: "Metro Freight",
        carrier: "UPS",
        pickup: "San Francisco, CA",
        delivery: "Portland, OR",
        pickup_date: "2024-01-12",
        delivery_date: "2024-01-14",
        status: ShipmentStatus::Delivered,
        weight: 180.0,
        rate: 340.0,
        notes: "Retail goods",
    },
    Sample {
        shipper: "Express Haul",
        carrier: "DHL",
        pickup: "Houston, TX",
        delivery: "Nashville, TN",
        pickup_date: "2024-01-28",
        delivery_date: "2024-02-02",
        status: ShipmentStatus::Delayed,
        weight: 250.0,
        rate: 490.0,
        notes: "Furniture",
    },
    Sample {
        shipper: "Swift Trans",
        carrier: "FedEx",
        pickup: "Philadelphia, PA",
        delivery: "Detroit, MI",
        pickup_date: "2024-01-30",
        delivery_date: "2024-02-03",
        status: ShipmentStatus::Pending,
        weight: 95.0,
        rate: 210.0,
        notes: "Electronics",
    },
    Sample {
        shipper: "Reliable Cargo",
        carrier: "UPS",
        pickup: "Minneapolis, MN",
        delivery: "St. Louis, MO",
        pickup_date: "2024-01-10",
        delivery_date: "2024-01-12",
        status: ShipmentStatus::Delivered,
        weight: 400.0,
        rate: 850.0,
        notes: "Industrial equipment",
    },
    Sample {
        shipper: "National Shipping",
        carrier: "DHL",
        pickup: "Las Vegas, NV",
        delivery: "Salt Lake City, UT",
        pickup_date: "2024-02-01",
        delivery_date: "2024-02-05",
        status: ShipmentStatus::Cancelled,
        weight: 60.0,
        rate: 150.0,
        notes: "Cancelled by customer",
    },
    Sample {
        shipper: "Coast to Coast",
        carrier: "FedEx",
        pickup: "San Diego, CA",
        delivery: "Jacksonville, FL",
        pickup_date: "2024-02-05",
        delivery_date: "2024-02-12",
        status: ShipmentStatus::Pending,
        weight: 500.0,
        rate: 1200.0,
        notes: "Heavy machinery",
    },
    Sample {
        shipper: "Blue Arrow Logistics",
        carrier: "USPS",
        pickup: "Orlando, FL",
        delivery: "Charlotte, NC",
        pickup_date: "2024-02-08",
        delivery_date: "2024-02-11",
        status: ShipmentStatus::InTransit,
        weight: 30.0,
        rate: 85.0,
        notes: "Small packages",
    },
];

/// Fresh records for the sample dataset, each with new identifiers.
pub fn sample_shipments(now: DateTime<Utc>) -> Result<Vec<Shipment>, ResolveError> {
    SAMPLES
        .iter()
        .map(|sample| {
            Ok(Shipment {
                id: ObjectId::new(),
                shipment_id: generate_shipment_id(),
                shipper_name: sample.shipper.to_string(),
                carrier_name: sample.carrier.to_string(),
                pickup_location: sample.pickup.to_string(),
                delivery_location: sample.delivery.to_string(),
                pickup_date: parse_calendar_date("pickupDate", sample.pickup_date)?,
                delivery_date: parse_calendar_date("deliveryDate", sample.delivery_date)?,
                status: sample.status,
                tracking_number: generate_tracking_number(),
                weight: sample.weight,
                rate: sample.rate,
                is_flagged: false,
                notes: sample.notes.to_string(),
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_dataset_shape() {
        let shipments = sample_shipments(Utc::now()).unwrap();
        assert_eq!(shipments.len(), 12);

        let ids: HashSet<_> = shipments.iter().map(|s| s.shipment_id.as_str()).collect();
        assert_eq!(ids.len(), 12);

        let pending = shipments
            .iter()
            .filter(|s| s.status == ShipmentStatus::Pending)
            .count();
        assert_eq!(pending, 4);
        assert!(shipments.iter().all(|s| !s.is_flagged));
    }
}
