//! Object factories and type identity
//!
//! Concrete serializable classes register a factory keyed by their type
//! hash so deserialization can instantiate them from a type tag alone. The
//! same registry remembers the plain-text names behind type hashes for
//! reverse lookups in text output.

use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::foundation::ptr::SharedPtr;
use crate::foundation::string_hash::StringHash;
use crate::object::serializable::{ObjectHandle, Serializable};

/// Static type identity of a serializable class. Implemented with the
/// [`object_type!`](crate::object_type) macro.
pub trait ObjectType: Serializable + Sized {
    /// Hash of the class name.
    fn static_type() -> StringHash;

    /// Class name.
    fn static_type_name() -> &'static str;
}

/// Implement [`ObjectType`](crate::object::factory::ObjectType) for a
/// serializable class, deriving the type identity from the class name.
#[macro_export]
macro_rules! object_type {
    ($ty:ident) => {
        impl $crate::object::factory::ObjectType for $ty {
            fn static_type() -> $crate::foundation::string_hash::StringHash {
                const TYPE: $crate::foundation::string_hash::StringHash =
                    $crate::foundation::string_hash::StringHash::of(stringify!($ty));
                TYPE
            }

            fn static_type_name() -> &'static str {
                stringify!($ty)
            }
        }
    };
}

type CreateFn = fn() -> ObjectHandle;

static FACTORIES: LazyLock<RwLock<HashMap<StringHash, CreateFn>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static TYPE_NAMES: LazyLock<RwLock<HashMap<StringHash, String>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn create_instance<T: ObjectType + Default>() -> ObjectHandle {
    SharedPtr::new(T::default()).to_handle()
}

/// Register a factory for class `T`, allowing instances to be created from
/// its type hash during deserialization.
pub fn register_factory<T: ObjectType + Default>() {
    register_type_name(T::static_type_name());
    FACTORIES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(T::static_type(), create_instance::<T>);
}

/// Create an object of a registered class. Returns a null handle when no
/// factory has been registered for the type; the caller takes ownership of
/// the new object.
pub fn create_object(object_type: StringHash) -> ObjectHandle {
    let create = FACTORIES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&object_type)
        .copied();
    match create {
        Some(create) => create(),
        None => ObjectHandle::null(),
    }
}

/// Remember the plain-text name behind a type hash and return the hash.
pub fn register_type_name(name: &str) -> StringHash {
    let hash = StringHash::of(name);
    TYPE_NAMES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(hash)
        .or_insert_with(|| name.to_string());
    hash
}

/// Plain-text name behind a type hash, if it has been seen by name in this
/// process.
pub fn type_name_from_type(object_type: StringHash) -> Option<String> {
    TYPE_NAMES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&object_type)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_type;
    use std::any::Any;

    #[derive(Default)]
    struct Prototype {
        counter: u32,
    }

    object_type!(Prototype);

    impl Serializable for Prototype {
        fn object_type(&self) -> StringHash {
            Self::static_type()
        }

        fn type_name(&self) -> &'static str {
            Self::static_type_name()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_create_registered_type() {
        register_factory::<Prototype>();

        let handle = create_object(Prototype::static_type());
        assert!(!handle.is_null());
        assert_eq!(handle.borrow().type_name(), "Prototype");

        let typed = handle.dynamic_cast::<Prototype>();
        assert!(!typed.is_null());
        assert_eq!(typed.borrow().counter, 0);
    }

    #[test]
    fn test_unknown_type_yields_null() {
        assert!(create_object(StringHash::of("NoSuchClass")).is_null());
    }

    #[test]
    fn test_type_name_lookup() {
        register_factory::<Prototype>();
        assert_eq!(
            type_name_from_type(Prototype::static_type()),
            Some("Prototype".to_string())
        );
        assert_eq!(type_name_from_type(StringHash::of("NeverSeen")), None);

        let hash = register_type_name("Material");
        assert_eq!(hash, StringHash::of("Material"));
        assert_eq!(type_name_from_type(hash), Some("Material".to_string()));
    }
}
