//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Lots, suppliers, clinics and logistics providers are all entities: two rows with
/// the same id are the same thing even when their quantities or counters differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
