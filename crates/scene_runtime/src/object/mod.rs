//! Serializable object framework: attribute descriptors, per-class
//! registration, dual binary/JSON serialization, object factories and
//! deferred reference resolution.

pub mod attribute;
pub mod factory;
pub mod resolver;
pub mod serializable;

pub use attribute::{Attribute, AttributeType, AttributeValue};
pub use factory::{create_object, register_factory, ObjectType};
pub use resolver::ObjectResolver;
pub use serializable::{ObjectHandle, Serializable};
