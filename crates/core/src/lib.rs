//! `depscope-core`: domain foundation building blocks.
//!
//! Pure primitives shared by the EDN reader, the session authority and the
//! HTTP layer (no transport or storage concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;
pub mod values;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::SessionId;
pub use value_object::ValueObject;
pub use values::{Password, SessionToken, Username};
