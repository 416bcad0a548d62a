//! Raw order records and their classification into shipment events.
//!
//! A record is one comma-separated line of the orders input. Its field count alone
//! decides what it is:
//!
//! | fields | event | layout |
//! |---|---|---|
//! | 3 | receive | `supplier_name,amount,date` |
//! | 2 | send | `clinic_location,amount` |
//!
//! Anything else is malformed. No further validation happens here; unknown supplier
//! or clinic names are the engine's business.

use thiserror::Error;

use vaxtrack_core::{Quantity, ReceivedDate};

use crate::shipment::{ReceiveShipment, SendShipment, ShipmentEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventParseError {
    #[error("expected 2 (send) or 3 (receive) fields, found {found}")]
    FieldCount { found: usize },

    #[error("invalid {field}: {value:?} is not a positive integer")]
    InvalidAmount { field: &'static str, value: String },

    #[error("{field} is empty")]
    EmptyField { field: &'static str },
}

/// One order line split into trimmed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    fields: Vec<String>,
}

impl EventRecord {
    pub fn from_line(line: &str) -> Self {
        Self {
            fields: line.split(',').map(|f| f.trim().to_string()).collect(),
        }
    }

    fn len(&self) -> usize {
        self.fields.len()
    }
}

impl TryFrom<EventRecord> for ShipmentEvent {
    type Error = EventParseError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let found = record.len();
        let mut fields = record.fields.into_iter();

        match (fields.next(), fields.next(), fields.next(), found) {
            (Some(supplier_name), Some(amount), Some(date), 3) => {
                Ok(ShipmentEvent::Receive(ReceiveShipment {
                    supplier_name: non_empty("supplier name", supplier_name)?,
                    amount: parse_amount(&amount)?,
                    received_date: ReceivedDate::new(non_empty("received date", date)?),
                }))
            }
            (Some(clinic_location), Some(amount), None, 2) => {
                Ok(ShipmentEvent::Send(SendShipment {
                    clinic_location: non_empty("clinic location", clinic_location)?,
                    amount: parse_amount(&amount)?,
                }))
            }
            _ => Err(EventParseError::FieldCount { found }),
        }
    }
}

impl ShipmentEvent {
    /// Parse one orders line into a shipment event.
    pub fn parse_line(line: &str) -> Result<Self, EventParseError> {
        ShipmentEvent::try_from(EventRecord::from_line(line))
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, EventParseError> {
    if value.is_empty() {
        Err(EventParseError::EmptyField { field })
    } else {
        Ok(value)
    }
}

fn parse_amount(raw: &str) -> Result<Quantity, EventParseError> {
    let invalid = || EventParseError::InvalidAmount {
        field: "amount",
        value: raw.to_string(),
    };

    let units = raw.parse::<i64>().map_err(|_| invalid())?;
    if units <= 0 {
        return Err(invalid());
    }
    Quantity::new(units).map_err(|_| invalid())
}
