//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every stored record (user, book) is an entity keyed by a store-assigned id.
pub trait Entity: Clone {
    /// Strongly-typed entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug + From<i64> + Into<i64>;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
