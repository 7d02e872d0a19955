//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. Two
/// [`Username`](crate::Username)s holding the same text are the same username;
/// a session is an entity instead.
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy
/// - **PartialEq**: compared by value
/// - **Debug**: loggable (implementations may redact, see `Password`)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
