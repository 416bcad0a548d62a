/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts read from the orders input)
/// - **named** (stable identifiers used in logs)
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "shipment.received").
    fn event_type(&self) -> &'static str;
}
