//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Sessions are the only entities in this system: they keep their identity
/// while their expiry is refreshed.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
