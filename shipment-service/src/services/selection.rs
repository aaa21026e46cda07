//! Client-driven field selection over rendered records.

use crate::dtos::{ShipmentView, UserView};
use crate::services::error::ResolveError;
use crate::services::policy::OperationKind;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Which record shape an operation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Shipment,
    User,
    /// Plain boolean results; a selection is accepted and ignored.
    Scalar,
}

impl RecordKind {
    pub fn of(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Me | OperationKind::Login | OperationKind::DemoLogin => RecordKind::User,
            OperationKind::DeleteShipment | OperationKind::SeedData => RecordKind::Scalar,
            OperationKind::Shipments
            | OperationKind::Shipment
            | OperationKind::TrackShipment
            | OperationKind::CreateShipment
            | OperationKind::UpdateShipment
            | OperationKind::FlagShipment => RecordKind::Shipment,
        }
    }

    fn known_fields(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Shipment => &ShipmentView::FIELDS,
            RecordKind::User => &UserView::FIELDS,
            RecordKind::Scalar => &[],
        }
    }
}

/// `None` keeps every field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSelection {
    fields: Option<BTreeSet<String>>,
}

impl FieldSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn parse(kind: RecordKind, fields: Option<Vec<String>>) -> Result<Self, ResolveError> {
        let Some(fields) = fields else {
            return Ok(Self::all());
        };
        if kind == RecordKind::Scalar {
            return Ok(Self::all());
        }
        if fields.is_empty() {
            return Err(ResolveError::validation("fields must not be empty"));
        }

        let known = kind.known_fields();
        if let Some(unknown) = fields.iter().find(|f| !known.contains(&f.as_str())) {
            return Err(ResolveError::validation(format!("Unknown field '{}'", unknown)));
        }

        Ok(Self {
            fields: Some(fields.into_iter().collect()),
        })
    }

    pub fn keeps(&self, key: &str) -> bool {
        self.fields.as_ref().map_or(true, |fields| fields.contains(key))
    }

    /// Projects a single record object. Non-objects (e.g. `null`) pass through.
    pub fn project(&self, value: Value) -> Value {
        match value {
            Value::Object(map) if self.fields.is_some() => Value::Object(
                map.into_iter()
                    .filter(|(k, _)| self.keeps(k))
                    .collect::<Map<String, Value>>(),
            ),
            other => other,
        }
    }

    /// Projects every record of an array, leaving anything else untouched.
    pub fn project_all(&self, value: Value) -> Value {
        match value {
            Value::Array(records) => {
                Value::Array(records.into_iter().map(|r| self.project(r)).collect())
            }
            other => other,
        }
    }
}
