//! Attribute-driven serialization
//!
//! A serializable class registers its attributes once, keyed by its type
//! hash; after that, binary and JSON save/load are driven entirely by the
//! registered list. The binary format is positional: a VLE attribute count,
//! then one type tag byte plus the encoded value per attribute, in
//! registration order. Loading checks both the position and the tag; any
//! mismatch falls back to a type-directed skip, so data written by a newer
//! or older registration still parses, with unmatched fields keeping their
//! defaults. The JSON format is name-keyed and tolerant of added or removed
//! fields by construction.
//!
//! Object-reference attributes are never applied while loading; they are
//! captured into an [`ObjectResolver`] and patched after the whole object
//! graph exists.

use std::any::Any;
use std::cell::{Ref, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use serde_json::{Map, Value};

use crate::foundation::ptr::{PtrInner, RefCount, SharedPtr};
use crate::foundation::string_hash::StringHash;
use crate::io::{ObjectRef, Stream, StreamError};
use crate::object::attribute::{Attribute, AttributeType, AttributeValueType};
use crate::object::resolver::ObjectResolver;

/// Capability for objects with a registered class identity whose fields can
/// be serialized through the attribute system.
pub trait Serializable: Any {
    /// Hash of the class name, the key into the attribute registry.
    fn object_type(&self) -> StringHash;

    /// Class name.
    fn type_name(&self) -> &'static str;

    /// Id used to refer to this object from other objects in serialized
    /// data. Zero when the object is not addressable.
    fn id(&self) -> u32 {
        0
    }

    /// Upcast for checked downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for checked downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The attribute list registered for this object's class, or `None` if
    /// the class has never registered any.
    fn attributes(&self) -> Option<Vec<Arc<Attribute>>> {
        class_attributes(self.object_type())
    }

    /// Find an attribute of this object's class by name.
    fn find_attribute(&self, name: &str) -> Option<Arc<Attribute>> {
        find_class_attribute(self.object_type(), name)
    }
}

type AttributeList = Vec<Arc<Attribute>>;

static CLASS_ATTRIBUTES: LazyLock<RwLock<HashMap<StringHash, AttributeList>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register an attribute for class `T`, replacing any previous attribute
/// with the same name in place.
///
/// Registration is expected to happen during single-threaded startup,
/// before any serialization runs.
pub fn register_attribute<T, V>(name: &str, get: fn(&T) -> V, set: fn(&mut T, V), default: V)
where
    T: crate::object::factory::ObjectType,
    V: AttributeValueType,
{
    register_class_attribute(T::static_type(), Arc::new(Attribute::new(name, get, set, default)));
}

/// Register an attribute descriptor for a class by type hash. If the class
/// already has an attribute with the same name, the descriptor replaces it
/// in place, preserving its position in the list.
pub fn register_class_attribute(class_type: StringHash, attr: Arc<Attribute>) {
    let mut registry = CLASS_ATTRIBUTES
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let list = registry.entry(class_type).or_default();
    if let Some(existing) = list.iter_mut().find(|a| a.name() == attr.name()) {
        *existing = attr;
    } else {
        list.push(attr);
    }
}

/// Append every attribute of a base class to a derived class's list. This
/// lets a class inherit serializable fields from a single registration
/// point.
///
/// The copied descriptors keep their original accessor bindings, so the
/// deriving identity must be served by the same concrete Rust type as the
/// base (a type registered under an additional class identity); a distinct
/// struct registers its own accessors instead.
pub fn copy_base_attributes(class_type: StringHash, base_type: StringHash) {
    if class_type == base_type {
        return;
    }
    let base = {
        let registry = CLASS_ATTRIBUTES
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        registry.get(&base_type).cloned()
    };
    if let Some(base) = base {
        for attr in base {
            register_class_attribute(class_type, attr);
        }
    }
}

/// The attribute list of a class, or `None` if it has never registered any.
pub fn class_attributes(class_type: StringHash) -> Option<Vec<Arc<Attribute>>> {
    CLASS_ATTRIBUTES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&class_type)
        .cloned()
}

/// Find a class attribute by name with a linear scan.
pub fn find_class_attribute(class_type: StringHash, name: &str) -> Option<Arc<Attribute>> {
    class_attributes(class_type)?
        .iter()
        .find(|a| a.name() == name)
        .cloned()
}

/// Save all attributes of an object to a binary stream: the attribute
/// count, then a type tag byte plus the encoded value per attribute, in
/// registration order.
pub fn save(instance: &dyn Serializable, dest: &mut dyn Stream) -> Result<(), StreamError> {
    let Some(attrs) = class_attributes(instance.object_type()) else {
        return Ok(());
    };
    dest.write_vle(attrs.len() as u32)?;
    for attr in &attrs {
        dest.write_u8(attr.kind().tag())?;
        attr.to_binary(instance, dest)?;
    }
    Ok(())
}

/// Load attributes of an object from a binary stream written by [`save`].
///
/// Each encoded attribute is applied only when its position and type tag
/// both match the current registration; otherwise its bytes are skipped
/// type-directed and the field keeps its current value. Object-reference
/// attributes are stored into `resolver` together with the id read from the
/// stream instead of being applied.
///
/// # Panics
///
/// Panics if `object` is a null handle.
pub fn load(
    object: &ObjectHandle,
    source: &mut dyn Stream,
    resolver: &mut ObjectResolver,
) -> Result<(), StreamError> {
    let attrs = {
        let guard = object.borrow();
        class_attributes(guard.object_type())
    };
    let Some(attrs) = attrs else {
        return Ok(());
    };

    let count = source.read_vle()? as usize;
    for index in 0..count {
        let tag = source.read_u8()?;
        // Unknown tags have no known encoding; treat them as zero-size.
        let Some(kind) = AttributeType::from_tag(tag) else {
            continue;
        };

        let matching = attrs.get(index).filter(|attr| attr.kind() == kind);
        match matching {
            Some(attr) if kind == AttributeType::ObjectRef => {
                let reference = ObjectRef::from_binary(source)?;
                resolver.store_object_ref(object.clone(), Arc::clone(attr), reference);
            }
            Some(attr) => {
                attr.from_binary(&mut *object.borrow_mut(), source)?;
            }
            None => {
                Attribute::skip(kind, source)?;
            }
        }
    }
    Ok(())
}

/// Save all non-default attributes of an object as a name-keyed JSON
/// object. Attributes whose current value equals their registered default
/// are omitted.
pub fn save_json(instance: &dyn Serializable) -> Value {
    let mut map = Map::new();
    if let Some(attrs) = class_attributes(instance.object_type()) {
        for attr in &attrs {
            if !attr.is_default(instance) {
                map.insert(attr.name().to_string(), attr.to_json(instance));
            }
        }
    }
    Value::Object(map)
}

/// Load attributes of an object from a name-keyed JSON object. Missing keys
/// keep the current value; object-reference attributes are stored into
/// `resolver`.
///
/// # Panics
///
/// Panics if `object` is a null handle.
pub fn load_json(object: &ObjectHandle, source: &Value, resolver: &mut ObjectResolver) {
    let attrs = {
        let guard = object.borrow();
        class_attributes(guard.object_type())
    };
    let (Some(attrs), Some(map)) = (attrs, source.as_object()) else {
        return;
    };

    for attr in &attrs {
        let Some(value) = map.get(attr.name()) else {
            continue;
        };
        if attr.kind() == AttributeType::ObjectRef {
            let id = value.as_u64().and_then(|v| u32::try_from(v).ok()).unwrap_or(0);
            resolver.store_object_ref(object.clone(), Arc::clone(attr), ObjectRef::new(id));
        } else {
            attr.from_json(&mut *object.borrow_mut(), value);
        }
    }
}

/// Advance a binary stream past one object's attributes without applying
/// them. Used when the object's type is unknown but the stream must stay in
/// sync.
pub fn skip(source: &mut dyn Stream) -> Result<(), StreamError> {
    let count = source.read_vle()?;
    for _ in 0..count {
        let tag = source.read_u8()?;
        if let Some(kind) = AttributeType::from_tag(tag) {
            Attribute::skip(kind, source)?;
        }
    }
    Ok(())
}

/// Cell access shared by every serializable object regardless of its
/// concrete type.
pub(crate) trait SerializableCell {
    fn count(&self) -> &RefCount;
    fn borrow_object(&self) -> Option<Ref<'_, dyn Serializable>>;
    fn borrow_object_mut(&self) -> Option<RefMut<'_, dyn Serializable>>;
    fn destroy_object(&self);
    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Serializable> SerializableCell for PtrInner<T> {
    fn count(&self) -> &RefCount {
        &self.count
    }

    fn borrow_object(&self) -> Option<Ref<'_, dyn Serializable>> {
        Ref::filter_map(self.target.borrow(), |slot| {
            slot.as_ref().map(|object| object as &dyn Serializable)
        })
        .ok()
    }

    fn borrow_object_mut(&self) -> Option<RefMut<'_, dyn Serializable>> {
        RefMut::filter_map(self.target.borrow_mut(), |slot| {
            slot.as_mut().map(|object| object as &mut dyn Serializable)
        })
        .ok()
    }

    fn destroy_object(&self) {
        self.destroy();
    }

    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Type-erased strong handle to any serializable object.
///
/// Shares the same reference count cell as every typed [`SharedPtr`] to the
/// object, so mixing erased and typed handles keeps one consistent count.
/// Produced by the object factory and consumed by the load engine and the
/// resolver.
pub struct ObjectHandle {
    cell: Option<Rc<dyn SerializableCell>>,
}

impl ObjectHandle {
    /// Construct a null handle.
    pub fn null() -> Self {
        Self { cell: None }
    }

    pub(crate) fn from_cell(cell: Rc<dyn SerializableCell>) -> Self {
        cell.count().add_ref();
        Self { cell: Some(cell) }
    }

    /// Whether this is a null handle.
    pub fn is_null(&self) -> bool {
        self.cell.is_none()
    }

    /// Borrow the object immutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or the object is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, dyn Serializable> {
        match self.try_borrow() {
            Some(r) => r,
            None => panic!("dereferenced a null object handle"),
        }
    }

    /// Borrow the object mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or the object is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Serializable> {
        match self.try_borrow_mut() {
            Some(r) => r,
            None => panic!("dereferenced a null object handle"),
        }
    }

    /// Borrow the object immutably, or `None` for a null handle.
    pub fn try_borrow(&self) -> Option<Ref<'_, dyn Serializable>> {
        self.cell.as_ref()?.borrow_object()
    }

    /// Borrow the object mutably, or `None` for a null handle.
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, dyn Serializable>> {
        self.cell.as_ref()?.borrow_object_mut()
    }

    /// Number of strong references, or 0 for a null handle.
    pub fn refs(&self) -> u32 {
        self.cell.as_ref().map_or(0, |c| c.count().refs())
    }

    /// Number of weak references, or 0 for a null handle.
    pub fn weak_refs(&self) -> u32 {
        self.cell.as_ref().map_or(0, |c| c.count().weak_refs())
    }

    /// Attempt a checked downcast to a typed handle. Returns a null
    /// [`SharedPtr`] when the object is not of type `T` or this handle is
    /// null.
    pub fn dynamic_cast<T: Serializable>(&self) -> SharedPtr<T> {
        let Some(cell) = &self.cell else {
            return SharedPtr::null();
        };
        match Rc::clone(cell).as_any_rc().downcast::<PtrInner<T>>() {
            Ok(inner) => SharedPtr::from_inner(inner),
            Err(_) => SharedPtr::null(),
        }
    }
}

impl Clone for ObjectHandle {
    fn clone(&self) -> Self {
        if let Some(cell) = &self.cell {
            cell.count().add_ref();
        }
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.take() {
            if cell.count().release_ref() {
                cell.destroy_object();
            }
        }
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::null()
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        match (&self.cell, &other.cell) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for ObjectHandle {}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Some(cell) => write!(f, "ObjectHandle(refs={})", cell.count().refs()),
            None => write!(f, "ObjectHandle(null)"),
        }
    }
}

impl<T: Serializable> SharedPtr<T> {
    /// Create a type-erased handle sharing this handle's reference count.
    pub fn to_handle(&self) -> ObjectHandle {
        match self.inner() {
            Some(inner) => ObjectHandle::from_cell(Rc::clone(inner) as Rc<dyn SerializableCell>),
            None => ObjectHandle::null(),
        }
    }
}
