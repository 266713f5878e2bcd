//! Serialization-local object references

use super::stream::{Stream, StreamError};

/// Reference to another serialized object by its id in the same data.
///
/// This is an integer stand-in for a pointer between two serializable
/// objects; ids are only meaningful inside the data they were written to,
/// and are rewritten by the resolver when a load pass completes. Id 0 means
/// "no reference".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectRef {
    /// Object id in the serialized data.
    pub id: u32,
}

impl ObjectRef {
    /// Construct with an id.
    pub const fn new(id: u32) -> Self {
        Self { id }
    }

    /// Construct a null reference.
    pub const fn null() -> Self {
        Self { id: 0 }
    }

    /// Whether this reference points at nothing.
    pub const fn is_null(self) -> bool {
        self.id == 0
    }

    /// Deserialize from a binary stream.
    pub fn from_binary(source: &mut dyn Stream) -> Result<Self, StreamError> {
        Ok(Self::new(source.read_u32()?))
    }

    /// Serialize to a binary stream.
    pub fn to_binary(self, dest: &mut dyn Stream) -> Result<(), StreamError> {
        dest.write_u32(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::VectorBuffer;

    #[test]
    fn test_null_reference() {
        assert!(ObjectRef::null().is_null());
        assert!(ObjectRef::default().is_null());
        assert!(!ObjectRef::new(7).is_null());
    }

    #[test]
    fn test_binary_round_trip() {
        let mut buffer = VectorBuffer::new();
        ObjectRef::new(1234).to_binary(&mut buffer).unwrap();
        buffer.seek(0).unwrap();
        assert_eq!(ObjectRef::from_binary(&mut buffer).unwrap(), ObjectRef::new(1234));
    }
}
