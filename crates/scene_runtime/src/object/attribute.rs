//! Serializable attribute descriptors
//!
//! An attribute is a named, typed field of a serializable class, declared
//! once at registration time and driven entirely through a type-erased
//! accessor after that. Each declared type tag knows its binary encoding
//! (fixed-size for numeric/vector/matrix types, length- or
//! null-terminated for variable-size ones) and its JSON encoding (native
//! scalars, or the whitespace-separated text form for compound math types).
//! Type tags are written to binary data as one byte whose value is the enum
//! ordinal; the ordinals are part of the wire format and must not be
//! reordered.

use std::fmt;

use serde_json::{Number, Value};

use crate::foundation::math::{
    BoundingBox, Color, IntRect, IntVector2, Mat3, Mat3x4, Mat4, Quat, Rect, TextCodec, Vec2,
    Vec3, Vec4,
};
use crate::io::{ObjectRef, ResourceRef, ResourceRefList, Stream, StreamError};
use crate::object::serializable::Serializable;

/// Supported attribute types. The ordinal of each variant is its binary
/// type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeType {
    /// Boolean stored as one byte.
    Bool = 0,
    /// 8-bit unsigned integer.
    Byte,
    /// 32-bit unsigned integer.
    Unsigned,
    /// 32-bit signed integer.
    Int,
    /// 2D integer vector.
    IntVector2,
    /// Integer rectangle.
    IntRect,
    /// 32-bit float.
    Float,
    /// 2D float vector.
    Vector2,
    /// 3D float vector.
    Vector3,
    /// 4D float vector.
    Vector4,
    /// Rotation quaternion.
    Quaternion,
    /// RGBA color.
    Color,
    /// Float rectangle.
    Rect,
    /// Axis-aligned bounding box.
    BoundingBox,
    /// 3x3 matrix.
    Matrix3,
    /// 3x4 matrix.
    Matrix3x4,
    /// 4x4 matrix.
    Matrix4,
    /// UTF-8 string.
    String,
    /// Typed resource reference.
    ResourceRef,
    /// List of typed resource references.
    ResourceRefList,
    /// Reference to another serialized object by id.
    ObjectRef,
    /// Arbitrary JSON value.
    JsonValue,
}

impl AttributeType {
    /// All attribute types in tag order.
    pub const ALL: [Self; 22] = [
        Self::Bool,
        Self::Byte,
        Self::Unsigned,
        Self::Int,
        Self::IntVector2,
        Self::IntRect,
        Self::Float,
        Self::Vector2,
        Self::Vector3,
        Self::Vector4,
        Self::Quaternion,
        Self::Color,
        Self::Rect,
        Self::BoundingBox,
        Self::Matrix3,
        Self::Matrix3x4,
        Self::Matrix4,
        Self::String,
        Self::ResourceRef,
        Self::ResourceRefList,
        Self::ObjectRef,
        Self::JsonValue,
    ];

    /// Decode a binary type tag, or `None` for an unknown tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// The binary type tag.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Byte size of the fixed-size binary encoding, or `None` for
    /// variable-size types.
    pub const fn byte_size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Byte => Some(1),
            Self::Unsigned | Self::Int | Self::Float | Self::ObjectRef => Some(4),
            Self::IntVector2 | Self::Vector2 => Some(8),
            Self::Vector3 => Some(12),
            Self::IntRect | Self::Vector4 | Self::Quaternion | Self::Color | Self::Rect => {
                Some(16)
            }
            Self::BoundingBox => Some(24),
            Self::Matrix3 => Some(36),
            Self::Matrix3x4 => Some(48),
            Self::Matrix4 => Some(64),
            Self::String | Self::ResourceRef | Self::ResourceRefList | Self::JsonValue => None,
        }
    }

    /// Human-readable type name.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Unsigned => "unsigned",
            Self::Int => "int",
            Self::IntVector2 => "IntVector2",
            Self::IntRect => "IntRect",
            Self::Float => "float",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::Vector4 => "Vector4",
            Self::Quaternion => "Quaternion",
            Self::Color => "Color",
            Self::Rect => "Rect",
            Self::BoundingBox => "BoundingBox",
            Self::Matrix3 => "Matrix3",
            Self::Matrix3x4 => "Matrix3x4",
            Self::Matrix4 => "Matrix4",
            Self::String => "String",
            Self::ResourceRef => "ResourceRef",
            Self::ResourceRefList => "ResourceRefList",
            Self::ObjectRef => "ObjectRef",
            Self::JsonValue => "JSONValue",
        }
    }

    /// Look up an attribute type from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.type_name() == name)
    }
}

/// One attribute value of any supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Boolean value.
    Bool(bool),
    /// 8-bit unsigned value.
    Byte(u8),
    /// 32-bit unsigned value.
    Unsigned(u32),
    /// 32-bit signed value.
    Int(i32),
    /// 2D integer vector value.
    IntVector2(IntVector2),
    /// Integer rectangle value.
    IntRect(IntRect),
    /// Float value.
    Float(f32),
    /// 2D vector value.
    Vector2(Vec2),
    /// 3D vector value.
    Vector3(Vec3),
    /// 4D vector value.
    Vector4(Vec4),
    /// Quaternion value.
    Quaternion(Quat),
    /// Color value.
    Color(Color),
    /// Rectangle value.
    Rect(Rect),
    /// Bounding box value.
    BoundingBox(BoundingBox),
    /// 3x3 matrix value.
    Matrix3(Mat3),
    /// 3x4 matrix value.
    Matrix3x4(Mat3x4),
    /// 4x4 matrix value.
    Matrix4(Mat4),
    /// String value.
    String(String),
    /// Resource reference value.
    ResourceRef(ResourceRef),
    /// Resource reference list value.
    ResourceRefList(ResourceRefList),
    /// Object reference value.
    ObjectRef(ObjectRef),
    /// JSON value.
    JsonValue(Value),
}

fn json_number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn write_components(dest: &mut dyn Stream, components: &[f32]) -> Result<(), StreamError> {
    for c in components {
        dest.write_f32(*c)?;
    }
    Ok(())
}

fn skip_string(source: &mut dyn Stream) -> Result<(), StreamError> {
    while !source.is_eof() {
        if source.read_u8()? == 0 {
            break;
        }
    }
    Ok(())
}

impl AttributeValue {
    /// The type tag of the contained value.
    pub const fn kind(&self) -> AttributeType {
        match self {
            Self::Bool(_) => AttributeType::Bool,
            Self::Byte(_) => AttributeType::Byte,
            Self::Unsigned(_) => AttributeType::Unsigned,
            Self::Int(_) => AttributeType::Int,
            Self::IntVector2(_) => AttributeType::IntVector2,
            Self::IntRect(_) => AttributeType::IntRect,
            Self::Float(_) => AttributeType::Float,
            Self::Vector2(_) => AttributeType::Vector2,
            Self::Vector3(_) => AttributeType::Vector3,
            Self::Vector4(_) => AttributeType::Vector4,
            Self::Quaternion(_) => AttributeType::Quaternion,
            Self::Color(_) => AttributeType::Color,
            Self::Rect(_) => AttributeType::Rect,
            Self::BoundingBox(_) => AttributeType::BoundingBox,
            Self::Matrix3(_) => AttributeType::Matrix3,
            Self::Matrix3x4(_) => AttributeType::Matrix3x4,
            Self::Matrix4(_) => AttributeType::Matrix4,
            Self::String(_) => AttributeType::String,
            Self::ResourceRef(_) => AttributeType::ResourceRef,
            Self::ResourceRefList(_) => AttributeType::ResourceRefList,
            Self::ObjectRef(_) => AttributeType::ObjectRef,
            Self::JsonValue(_) => AttributeType::JsonValue,
        }
    }

    /// Serialize to a binary stream.
    pub fn to_binary(&self, dest: &mut dyn Stream) -> Result<(), StreamError> {
        match self {
            Self::Bool(v) => dest.write_bool(*v),
            Self::Byte(v) => dest.write_u8(*v),
            Self::Unsigned(v) => dest.write_u32(*v),
            Self::Int(v) => dest.write_i32(*v),
            Self::IntVector2(v) => {
                dest.write_i32(v.x)?;
                dest.write_i32(v.y)
            }
            Self::IntRect(v) => {
                dest.write_i32(v.left)?;
                dest.write_i32(v.top)?;
                dest.write_i32(v.right)?;
                dest.write_i32(v.bottom)
            }
            Self::Float(v) => dest.write_f32(*v),
            Self::Vector2(v) => write_components(dest, &[v.x, v.y]),
            Self::Vector3(v) => write_components(dest, &[v.x, v.y, v.z]),
            Self::Vector4(v) => write_components(dest, &[v.x, v.y, v.z, v.w]),
            Self::Quaternion(v) => {
                write_components(dest, &[v.coords.w, v.coords.x, v.coords.y, v.coords.z])
            }
            Self::Color(v) => write_components(dest, &[v.r, v.g, v.b, v.a]),
            Self::Rect(v) => write_components(dest, &[v.min.x, v.min.y, v.max.x, v.max.y]),
            Self::BoundingBox(v) => write_components(
                dest,
                &[v.min.x, v.min.y, v.min.z, v.max.x, v.max.y, v.max.z],
            ),
            Self::Matrix3(v) => write_components(dest, v.as_slice()),
            Self::Matrix3x4(v) => write_components(dest, v.as_slice()),
            Self::Matrix4(v) => write_components(dest, v.as_slice()),
            Self::String(v) => dest.write_string(v),
            Self::ResourceRef(v) => v.to_binary(dest),
            Self::ResourceRefList(v) => v.to_binary(dest),
            Self::ObjectRef(v) => v.to_binary(dest),
            Self::JsonValue(v) => {
                let encoded = serde_json::to_vec(v)?;
                dest.write_buffer(&encoded)
            }
        }
    }

    /// Deserialize a value of the given type from a binary stream.
    pub fn from_binary(
        kind: AttributeType,
        source: &mut dyn Stream,
    ) -> Result<Self, StreamError> {
        Ok(match kind {
            AttributeType::Bool => Self::Bool(source.read_bool()?),
            AttributeType::Byte => Self::Byte(source.read_u8()?),
            AttributeType::Unsigned => Self::Unsigned(source.read_u32()?),
            AttributeType::Int => Self::Int(source.read_i32()?),
            AttributeType::IntVector2 => Self::IntVector2(IntVector2::new(
                source.read_i32()?,
                source.read_i32()?,
            )),
            AttributeType::IntRect => Self::IntRect(IntRect::new(
                source.read_i32()?,
                source.read_i32()?,
                source.read_i32()?,
                source.read_i32()?,
            )),
            AttributeType::Float => Self::Float(source.read_f32()?),
            AttributeType::Vector2 => {
                Self::Vector2(Vec2::new(source.read_f32()?, source.read_f32()?))
            }
            AttributeType::Vector3 => Self::Vector3(Vec3::new(
                source.read_f32()?,
                source.read_f32()?,
                source.read_f32()?,
            )),
            AttributeType::Vector4 => Self::Vector4(Vec4::new(
                source.read_f32()?,
                source.read_f32()?,
                source.read_f32()?,
                source.read_f32()?,
            )),
            AttributeType::Quaternion => Self::Quaternion(Quat::new(
                source.read_f32()?,
                source.read_f32()?,
                source.read_f32()?,
                source.read_f32()?,
            )),
            AttributeType::Color => Self::Color(Color::new(
                source.read_f32()?,
                source.read_f32()?,
                source.read_f32()?,
                source.read_f32()?,
            )),
            AttributeType::Rect => Self::Rect(Rect::new(
                Vec2::new(source.read_f32()?, source.read_f32()?),
                Vec2::new(source.read_f32()?, source.read_f32()?),
            )),
            AttributeType::BoundingBox => Self::BoundingBox(BoundingBox::new(
                Vec3::new(
                    source.read_f32()?,
                    source.read_f32()?,
                    source.read_f32()?,
                ),
                Vec3::new(
                    source.read_f32()?,
                    source.read_f32()?,
                    source.read_f32()?,
                ),
            )),
            AttributeType::Matrix3 => {
                let mut components = [0.0f32; 9];
                for c in &mut components {
                    *c = source.read_f32()?;
                }
                Self::Matrix3(Mat3::from_iterator(components))
            }
            AttributeType::Matrix3x4 => {
                let mut components = [0.0f32; 12];
                for c in &mut components {
                    *c = source.read_f32()?;
                }
                Self::Matrix3x4(Mat3x4::from_iterator(components))
            }
            AttributeType::Matrix4 => {
                let mut components = [0.0f32; 16];
                for c in &mut components {
                    *c = source.read_f32()?;
                }
                Self::Matrix4(Mat4::from_iterator(components))
            }
            AttributeType::String => Self::String(source.read_string()?),
            AttributeType::ResourceRef => Self::ResourceRef(ResourceRef::from_binary(source)?),
            AttributeType::ResourceRefList => {
                Self::ResourceRefList(ResourceRefList::from_binary(source)?)
            }
            AttributeType::ObjectRef => Self::ObjectRef(ObjectRef::from_binary(source)?),
            AttributeType::JsonValue => {
                let encoded = source.read_buffer()?;
                Self::JsonValue(serde_json::from_slice(&encoded)?)
            }
        })
    }

    /// Convert to a JSON value. Compound math types become their text form.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::Byte(v) => Value::Number(Number::from(*v)),
            Self::Unsigned(v) => Value::Number(Number::from(*v)),
            Self::Int(v) => Value::Number(Number::from(*v)),
            Self::IntVector2(v) => Value::String(v.to_text()),
            Self::IntRect(v) => Value::String(v.to_text()),
            Self::Float(v) => json_number(f64::from(*v)),
            Self::Vector2(v) => Value::String(v.to_text()),
            Self::Vector3(v) => Value::String(v.to_text()),
            Self::Vector4(v) => Value::String(v.to_text()),
            Self::Quaternion(v) => Value::String(v.to_text()),
            Self::Color(v) => Value::String(v.to_text()),
            Self::Rect(v) => Value::String(v.to_text()),
            Self::BoundingBox(v) => Value::String(v.to_text()),
            Self::Matrix3(v) => Value::String(v.to_text()),
            Self::Matrix3x4(v) => Value::String(v.to_text()),
            Self::Matrix4(v) => Value::String(v.to_text()),
            Self::String(v) => Value::String(v.clone()),
            Self::ResourceRef(v) => Value::String(v.to_text()),
            Self::ResourceRefList(v) => Value::String(v.to_text()),
            Self::ObjectRef(v) => Value::Number(Number::from(v.id)),
            Self::JsonValue(v) => v.clone(),
        }
    }

    /// Decode a value of the given type from JSON. Returns `None` when the
    /// JSON shape does not match, in which case the caller keeps its current
    /// value.
    pub fn from_json(kind: AttributeType, source: &Value) -> Option<Self> {
        Some(match kind {
            AttributeType::Bool => Self::Bool(source.as_bool()?),
            AttributeType::Byte => Self::Byte(u8::try_from(source.as_u64()?).ok()?),
            AttributeType::Unsigned => Self::Unsigned(u32::try_from(source.as_u64()?).ok()?),
            AttributeType::Int => Self::Int(i32::try_from(source.as_i64()?).ok()?),
            AttributeType::IntVector2 => {
                Self::IntVector2(IntVector2::from_text(source.as_str()?)?)
            }
            AttributeType::IntRect => Self::IntRect(IntRect::from_text(source.as_str()?)?),
            AttributeType::Float => Self::Float(source.as_f64()? as f32),
            AttributeType::Vector2 => Self::Vector2(Vec2::from_text(source.as_str()?)?),
            AttributeType::Vector3 => Self::Vector3(Vec3::from_text(source.as_str()?)?),
            AttributeType::Vector4 => Self::Vector4(Vec4::from_text(source.as_str()?)?),
            AttributeType::Quaternion => Self::Quaternion(Quat::from_text(source.as_str()?)?),
            AttributeType::Color => Self::Color(Color::from_text(source.as_str()?)?),
            AttributeType::Rect => Self::Rect(Rect::from_text(source.as_str()?)?),
            AttributeType::BoundingBox => {
                Self::BoundingBox(BoundingBox::from_text(source.as_str()?)?)
            }
            AttributeType::Matrix3 => Self::Matrix3(Mat3::from_text(source.as_str()?)?),
            AttributeType::Matrix3x4 => Self::Matrix3x4(Mat3x4::from_text(source.as_str()?)?),
            AttributeType::Matrix4 => Self::Matrix4(Mat4::from_text(source.as_str()?)?),
            AttributeType::String => Self::String(source.as_str()?.to_string()),
            AttributeType::ResourceRef => {
                Self::ResourceRef(ResourceRef::from_text(source.as_str()?)?)
            }
            AttributeType::ResourceRefList => {
                Self::ResourceRefList(ResourceRefList::from_text(source.as_str()?)?)
            }
            AttributeType::ObjectRef => {
                Self::ObjectRef(ObjectRef::new(u32::try_from(source.as_u64()?).ok()?))
            }
            AttributeType::JsonValue => Self::JsonValue(source.clone()),
        })
    }
}

/// Rust types that can be stored in an attribute.
pub trait AttributeValueType: Sized + 'static {
    /// The attribute type tag of this Rust type.
    const KIND: AttributeType;

    /// Wrap into an [`AttributeValue`].
    fn into_value(self) -> AttributeValue;

    /// Unwrap from an [`AttributeValue`] of the matching variant.
    fn from_value(value: AttributeValue) -> Option<Self>;
}

macro_rules! impl_attribute_value_type {
    ($ty:ty, $kind:ident) => {
        impl AttributeValueType for $ty {
            const KIND: AttributeType = AttributeType::$kind;

            fn into_value(self) -> AttributeValue {
                AttributeValue::$kind(self)
            }

            fn from_value(value: AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::$kind(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_attribute_value_type!(bool, Bool);
impl_attribute_value_type!(u8, Byte);
impl_attribute_value_type!(u32, Unsigned);
impl_attribute_value_type!(i32, Int);
impl_attribute_value_type!(IntVector2, IntVector2);
impl_attribute_value_type!(IntRect, IntRect);
impl_attribute_value_type!(f32, Float);
impl_attribute_value_type!(Vec2, Vector2);
impl_attribute_value_type!(Vec3, Vector3);
impl_attribute_value_type!(Vec4, Vector4);
impl_attribute_value_type!(Quat, Quaternion);
impl_attribute_value_type!(Color, Color);
impl_attribute_value_type!(Rect, Rect);
impl_attribute_value_type!(BoundingBox, BoundingBox);
impl_attribute_value_type!(Mat3, Matrix3);
impl_attribute_value_type!(Mat3x4, Matrix3x4);
impl_attribute_value_type!(Mat4, Matrix4);
impl_attribute_value_type!(String, String);
impl_attribute_value_type!(ResourceRef, ResourceRef);
impl_attribute_value_type!(ResourceRefList, ResourceRefList);
impl_attribute_value_type!(ObjectRef, ObjectRef);
impl_attribute_value_type!(Value, JsonValue);

/// Type-erased access to one field of one serializable class.
pub trait AttributeAccessor: Send + Sync {
    /// Read the current value from an instance. `None` if the instance is
    /// not of the class this accessor was bound to.
    fn get(&self, instance: &dyn Serializable) -> Option<AttributeValue>;

    /// Write a new value to an instance. False if the instance or value type
    /// did not match.
    fn set(&self, instance: &mut dyn Serializable, value: AttributeValue) -> bool;
}

/// Accessor over a getter/setter function pair of a concrete class.
pub struct FnAccessor<T, V> {
    get: fn(&T) -> V,
    set: fn(&mut T, V),
}

impl<T, V> FnAccessor<T, V> {
    /// Construct from a getter and setter.
    pub fn new(get: fn(&T) -> V, set: fn(&mut T, V)) -> Self {
        Self { get, set }
    }
}

impl<T: Serializable, V: AttributeValueType> AttributeAccessor for FnAccessor<T, V> {
    fn get(&self, instance: &dyn Serializable) -> Option<AttributeValue> {
        let typed = instance.as_any().downcast_ref::<T>()?;
        Some((self.get)(typed).into_value())
    }

    fn set(&self, instance: &mut dyn Serializable, value: AttributeValue) -> bool {
        let Some(typed) = instance.as_any_mut().downcast_mut::<T>() else {
            return false;
        };
        let Some(value) = V::from_value(value) else {
            return false;
        };
        (self.set)(typed, value);
        true
    }
}

/// Description of one automatically serialized field.
pub struct Attribute {
    name: String,
    kind: AttributeType,
    default: AttributeValue,
    enum_names: Vec<String>,
    accessor: Box<dyn AttributeAccessor>,
}

impl Attribute {
    /// Construct from a field name, accessor function pair and default
    /// value.
    pub fn new<T: Serializable, V: AttributeValueType>(
        name: &str,
        get: fn(&T) -> V,
        set: fn(&mut T, V),
        default: V,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: V::KIND,
            default: default.into_value(),
            enum_names: Vec::new(),
            accessor: Box::new(FnAccessor::new(get, set)),
        }
    }

    /// Attach zero-based enum value names for editor and tooling display.
    pub fn with_enum_names(mut self, names: &[&str]) -> Self {
        self.enum_names = names.iter().map(ToString::to_string).collect();
        self
    }

    /// Field name. Unique within one class's attribute list.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub const fn kind(&self) -> AttributeType {
        self.kind
    }

    /// Registered default value.
    pub const fn default_value(&self) -> &AttributeValue {
        &self.default
    }

    /// Enum value names, empty if none were registered.
    pub fn enum_names(&self) -> &[String] {
        &self.enum_names
    }

    /// Read the field's current value from an instance.
    pub fn get_value(&self, instance: &dyn Serializable) -> AttributeValue {
        match self.accessor.get(instance) {
            Some(value) => value,
            None => {
                debug_assert!(false, "attribute '{}' bound to a different class", self.name);
                self.default.clone()
            }
        }
    }

    /// Write a new value to the field of an instance.
    pub fn set_value(&self, instance: &mut dyn Serializable, value: AttributeValue) {
        let ok = self.accessor.set(instance, value);
        debug_assert!(ok, "attribute '{}' bound to a different class", self.name);
    }

    /// Whether the field's current value equals the registered default.
    pub fn is_default(&self, instance: &dyn Serializable) -> bool {
        self.get_value(instance) == self.default
    }

    /// Serialize the field's value to a binary stream.
    pub fn to_binary(
        &self,
        instance: &dyn Serializable,
        dest: &mut dyn Stream,
    ) -> Result<(), StreamError> {
        self.get_value(instance).to_binary(dest)
    }

    /// Deserialize a value from a binary stream and apply it.
    pub fn from_binary(
        &self,
        instance: &mut dyn Serializable,
        source: &mut dyn Stream,
    ) -> Result<(), StreamError> {
        let value = AttributeValue::from_binary(self.kind, source)?;
        self.set_value(instance, value);
        Ok(())
    }

    /// Serialize the field's value to JSON.
    pub fn to_json(&self, instance: &dyn Serializable) -> Value {
        self.get_value(instance).to_json()
    }

    /// Decode a value from JSON and apply it. A mismatched JSON shape leaves
    /// the current value untouched.
    pub fn from_json(&self, instance: &mut dyn Serializable, source: &Value) {
        if let Some(value) = AttributeValue::from_json(self.kind, source) {
            self.set_value(instance, value);
        }
    }

    /// Advance a binary stream past one encoded value of the given type
    /// without materializing it. An unknown (future) type tag has already
    /// been rejected by [`AttributeType::from_tag`] at this point; callers
    /// treat those as zero-size.
    pub fn skip(kind: AttributeType, source: &mut dyn Stream) -> Result<(), StreamError> {
        if let Some(size) = kind.byte_size() {
            source.seek(source.position() + size)?;
            return Ok(());
        }
        match kind {
            AttributeType::String => skip_string(source),
            AttributeType::ResourceRef => {
                source.read_u32()?;
                skip_string(source)
            }
            AttributeType::ResourceRefList => {
                source.read_u32()?;
                let count = source.read_vle()?;
                for _ in 0..count {
                    skip_string(source)?;
                }
                Ok(())
            }
            AttributeType::JsonValue => {
                let len = source.read_vle()? as usize;
                source.seek(source.position() + len)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::VectorBuffer;
    use serde_json::json;

    fn sample_values() -> Vec<AttributeValue> {
        vec![
            AttributeValue::Bool(true),
            AttributeValue::Byte(200),
            AttributeValue::Unsigned(3_000_000_000),
            AttributeValue::Int(-12345),
            AttributeValue::IntVector2(IntVector2::new(-2, 9)),
            AttributeValue::IntRect(IntRect::new(0, 0, 800, 600)),
            AttributeValue::Float(-0.125),
            AttributeValue::Vector2(Vec2::new(1.0, -2.0)),
            AttributeValue::Vector3(Vec3::new(0.0, 1.5, -3.0)),
            AttributeValue::Vector4(Vec4::new(1.0, 2.0, 3.0, 4.0)),
            AttributeValue::Quaternion(Quat::new(1.0, 0.0, 0.5, -0.5)),
            AttributeValue::Color(Color::new(0.1, 0.2, 0.3, 1.0)),
            AttributeValue::Rect(Rect::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0))),
            AttributeValue::BoundingBox(BoundingBox::new(
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, 1.0, 1.0),
            )),
            AttributeValue::Matrix3(Mat3::identity()),
            AttributeValue::Matrix3x4(Mat3x4::from_iterator((0..12).map(|i| i as f32))),
            AttributeValue::Matrix4(Mat4::from_iterator((0..16).map(|i| i as f32 * 0.5))),
            AttributeValue::String("Test! ✨".to_string()),
            AttributeValue::ResourceRef(ResourceRef::new("Material", "stone.json")),
            AttributeValue::ResourceRefList(ResourceRefList::new(
                "Model",
                vec!["a.mdl".to_string(), "b.mdl".to_string()],
            )),
            AttributeValue::ObjectRef(ObjectRef::new(42)),
            AttributeValue::JsonValue(json!({"nested": [1, 2, 3], "flag": true})),
        ]
    }

    #[test]
    fn test_every_type_has_a_sample() {
        let kinds: Vec<_> = sample_values().iter().map(AttributeValue::kind).collect();
        assert_eq!(kinds, AttributeType::ALL.to_vec());
    }

    #[test]
    fn test_binary_round_trip_all_types() {
        for value in sample_values() {
            let mut buffer = VectorBuffer::new();
            value.to_binary(&mut buffer).unwrap();
            buffer.seek(0).unwrap();
            let decoded = AttributeValue::from_binary(value.kind(), &mut buffer).unwrap();
            assert_eq!(decoded, value, "binary round trip of {:?}", value.kind());
            assert!(buffer.is_eof(), "trailing bytes after {:?}", value.kind());
        }
    }

    #[test]
    fn test_binary_round_trip_edge_values() {
        let edge_cases = vec![
            AttributeValue::Bool(false),
            AttributeValue::Byte(0),
            AttributeValue::Int(i32::MIN),
            AttributeValue::Unsigned(u32::MAX),
            AttributeValue::Float(0.0),
            AttributeValue::String(String::new()),
            AttributeValue::ObjectRef(ObjectRef::null()),
        ];
        for value in edge_cases {
            let mut buffer = VectorBuffer::new();
            value.to_binary(&mut buffer).unwrap();
            buffer.seek(0).unwrap();
            assert_eq!(
                AttributeValue::from_binary(value.kind(), &mut buffer).unwrap(),
                value
            );
        }
    }

    #[test]
    fn test_json_round_trip_all_types() {
        for value in sample_values() {
            let encoded = value.to_json();
            let decoded = AttributeValue::from_json(value.kind(), &encoded);
            assert_eq!(decoded, Some(value.clone()), "JSON round trip of {:?}", value.kind());
        }
    }

    #[test]
    fn test_json_mismatched_shape_is_rejected() {
        assert_eq!(AttributeValue::from_json(AttributeType::Int, &json!("nope")), None);
        assert_eq!(AttributeValue::from_json(AttributeType::Bool, &json!(1)), None);
        assert_eq!(
            AttributeValue::from_json(AttributeType::Vector3, &json!("1 2")),
            None
        );
        assert_eq!(AttributeValue::from_json(AttributeType::Byte, &json!(256)), None);
    }

    #[test]
    fn test_fixed_sizes_match_encoding() {
        for value in sample_values() {
            if let Some(size) = value.kind().byte_size() {
                let mut buffer = VectorBuffer::new();
                value.to_binary(&mut buffer).unwrap();
                assert_eq!(buffer.size(), size, "encoded size of {:?}", value.kind());
            }
        }
    }

    #[test]
    fn test_skip_advances_past_every_type() {
        for value in sample_values() {
            let mut buffer = VectorBuffer::new();
            value.to_binary(&mut buffer).unwrap();
            buffer.write_u32(0xCAFE_F00D).unwrap();

            buffer.seek(0).unwrap();
            Attribute::skip(value.kind(), &mut buffer).unwrap();
            assert_eq!(
                buffer.read_u32().unwrap(),
                0xCAFE_F00D,
                "skip of {:?} left wrong position",
                value.kind()
            );
        }
    }

    #[test]
    fn test_tag_round_trip() {
        for kind in AttributeType::ALL {
            assert_eq!(AttributeType::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(AttributeType::from_tag(22), None);
        assert_eq!(AttributeType::from_tag(255), None);
    }

    #[test]
    fn test_type_names_round_trip() {
        for kind in AttributeType::ALL {
            assert_eq!(AttributeType::from_name(kind.type_name()), Some(kind));
        }
        assert_eq!(AttributeType::from_name("NotAType"), None);
    }

    #[test]
    fn test_stable_tag_ordinals() {
        assert_eq!(AttributeType::Bool.tag(), 0);
        assert_eq!(AttributeType::Float.tag(), 6);
        assert_eq!(AttributeType::String.tag(), 17);
        assert_eq!(AttributeType::ObjectRef.tag(), 20);
        assert_eq!(AttributeType::JsonValue.tag(), 21);
    }
}
