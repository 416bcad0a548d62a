//! Shipment events and the order-record router.
//!
//! The orders input is a stream of comma-separated records. This crate turns each
//! record into a tagged [`ShipmentEvent`] so dispatch downstream is a pattern match.

pub mod envelope;
pub mod event;
pub mod record;
pub mod shipment;

pub use envelope::EventEnvelope;
pub use event::Event;
pub use record::{EventParseError, EventRecord};
pub use shipment::{ReceiveShipment, SendShipment, ShipmentEvent};
