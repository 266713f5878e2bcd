//! Byte-oriented streams and the serialization-local reference types
//! carried inside them.

pub mod memory_buffer;
pub mod object_ref;
pub mod resource_ref;
pub mod stream;
pub mod vector_buffer;

pub use memory_buffer::MemoryBuffer;
pub use object_ref::ObjectRef;
pub use resource_ref::{ResourceRef, ResourceRefList};
pub use stream::{Stream, StreamError};
pub use vector_buffer::VectorBuffer;
