//! Typed resource references for serialization
//!
//! Resources (meshes, materials, textures) are referenced from attributes by
//! type and name rather than by pointer. The text form is the type name and
//! resource name(s) separated by semicolons, e.g. `"Material;stone.json"`;
//! the binary form stores the type hash followed by the name(s). Turning the
//! hash back into a name for text output relies on the type having been seen
//! by name in this process (see [`crate::object::factory`]).

use super::stream::{Stream, StreamError};
use crate::foundation::string_hash::StringHash;
use crate::object::factory;

/// Typed resource reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceRef {
    /// Resource type.
    pub resource_type: StringHash,
    /// Resource name.
    pub name: String,
}

impl ResourceRef {
    /// Construct from a type name and resource name. The type name is
    /// remembered for later text output.
    pub fn new(type_name: &str, name: impl Into<String>) -> Self {
        Self {
            resource_type: factory::register_type_name(type_name),
            name: name.into(),
        }
    }

    /// Construct from an already hashed type.
    pub fn from_parts(resource_type: StringHash, name: impl Into<String>) -> Self {
        Self {
            resource_type,
            name: name.into(),
        }
    }

    /// Format as `"Type;name"`.
    pub fn to_text(&self) -> String {
        format!(
            "{};{}",
            factory::type_name_from_type(self.resource_type).unwrap_or_default(),
            self.name
        )
    }

    /// Parse from a `"Type;name"` string.
    pub fn from_text(text: &str) -> Option<Self> {
        let (type_name, name) = text.split_once(';')?;
        Some(Self::new(type_name, name))
    }

    /// Deserialize from a binary stream.
    pub fn from_binary(source: &mut dyn Stream) -> Result<Self, StreamError> {
        let resource_type = StringHash(source.read_u32()?);
        let name = source.read_string()?;
        Ok(Self {
            resource_type,
            name,
        })
    }

    /// Serialize to a binary stream.
    pub fn to_binary(&self, dest: &mut dyn Stream) -> Result<(), StreamError> {
        dest.write_u32(self.resource_type.value())?;
        dest.write_string(&self.name)
    }
}

/// List of typed resource references sharing one type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceRefList {
    /// Resource type.
    pub resource_type: StringHash,
    /// List of resource names.
    pub names: Vec<String>,
}

impl ResourceRefList {
    /// Construct from a type name and resource names. The type name is
    /// remembered for later text output.
    pub fn new(type_name: &str, names: Vec<String>) -> Self {
        Self {
            resource_type: factory::register_type_name(type_name),
            names,
        }
    }

    /// Format as `"Type;name1;name2;..."`.
    pub fn to_text(&self) -> String {
        let mut text = factory::type_name_from_type(self.resource_type).unwrap_or_default();
        for name in &self.names {
            text.push(';');
            text.push_str(name);
        }
        text
    }

    /// Parse from a `"Type;name1;name2;..."` string.
    pub fn from_text(text: &str) -> Option<Self> {
        let mut parts = text.split(';');
        let type_name = parts.next()?;
        if type_name.is_empty() && text.is_empty() {
            return None;
        }
        Some(Self::new(
            type_name,
            parts.map(str::to_string).collect(),
        ))
    }

    /// Deserialize from a binary stream.
    pub fn from_binary(source: &mut dyn Stream) -> Result<Self, StreamError> {
        let resource_type = StringHash(source.read_u32()?);
        let count = source.read_vle()? as usize;
        let mut names = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            names.push(source.read_string()?);
        }
        Ok(Self {
            resource_type,
            names,
        })
    }

    /// Serialize to a binary stream.
    pub fn to_binary(&self, dest: &mut dyn Stream) -> Result<(), StreamError> {
        dest.write_u32(self.resource_type.value())?;
        dest.write_vle(self.names.len() as u32)?;
        for name in &self.names {
            dest.write_string(name)?;
        }
        Ok(())
    }
}
