use serde::{Deserialize, Serialize};

use vaxtrack_core::{Quantity, ReceivedDate};

use crate::event::Event;

/// Event: a supplier delivered a new lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveShipment {
    pub supplier_name: String,
    pub amount: Quantity,
    pub received_date: ReceivedDate,
}

/// Event: units left the inventory for a clinic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendShipment {
    pub clinic_location: String,
    pub amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentEvent {
    Receive(ReceiveShipment),
    Send(SendShipment),
}

impl ShipmentEvent {
    pub fn amount(&self) -> Quantity {
        match self {
            ShipmentEvent::Receive(e) => e.amount,
            ShipmentEvent::Send(e) => e.amount,
        }
    }

    /// Supplier name or clinic location the event refers to.
    pub fn counterparty(&self) -> &str {
        match self {
            ShipmentEvent::Receive(e) => &e.supplier_name,
            ShipmentEvent::Send(e) => &e.clinic_location,
        }
    }
}

impl Event for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::Receive(_) => "shipment.received",
            ShipmentEvent::Send(_) => "shipment.sent",
        }
    }
}

impl From<ReceiveShipment> for ShipmentEvent {
    fn from(value: ReceiveShipment) -> Self {
        ShipmentEvent::Receive(value)
    }
}

impl From<SendShipment> for ShipmentEvent {
    fn from(value: SendShipment) -> Self {
        ShipmentEvent::Send(value)
    }
}
