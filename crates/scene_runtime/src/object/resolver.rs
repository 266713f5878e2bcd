//! Deferred object reference resolution
//!
//! Serialized object graphs are not necessarily written in reference order;
//! an object may refer to one defined later in the same data. Reference
//! attributes are therefore collected during the load pass instead of being
//! applied inline, and patched in one sweep once every object of the pass
//! has been constructed. The resolver lives exactly as long as one load
//! pass and is consumed by its final [`resolve`](ObjectResolver::resolve)
//! call.

use std::collections::HashMap;
use std::sync::Arc;

use crate::io::ObjectRef;
use crate::object::attribute::{Attribute, AttributeType, AttributeValue};
use crate::object::serializable::ObjectHandle;

/// Stored object ref attribute awaiting resolution.
struct StoredObjectRef {
    /// Object that contains the attribute.
    object: ObjectHandle,
    /// Description of the object ref attribute.
    attr: Arc<Attribute>,
    /// Old id from the serialized data.
    old_id: u32,
}

/// Helper for resolving object ref attributes when loading an object graph.
#[derive(Default)]
pub struct ObjectResolver {
    objects: HashMap<u32, ObjectHandle>,
    object_refs: Vec<StoredObjectRef>,
}

impl ObjectResolver {
    /// Construct an empty resolver for one load pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object constructed during this load pass under the id it
    /// had in the serialized data. A colliding id overwrites the earlier
    /// entry.
    pub fn store_object(&mut self, old_id: u32, object: ObjectHandle) {
        if !object.is_null() {
            self.objects.insert(old_id, object);
        }
    }

    /// Record a reference attribute that must be patched after the whole
    /// graph has been loaded.
    pub fn store_object_ref(&mut self, object: ObjectHandle, attr: Arc<Attribute>, value: ObjectRef) {
        if object.is_null() || attr.kind() != AttributeType::ObjectRef {
            return;
        }
        self.object_refs.push(StoredObjectRef {
            object,
            attr,
            old_id: value.id,
        });
    }

    /// Patch every recorded reference to the new, locally assigned id of
    /// its target. References whose old id was never stored produce a
    /// warning and leave the attribute untouched.
    pub fn resolve(self) {
        let Self {
            objects,
            object_refs,
        } = self;

        for stored in object_refs {
            if let Some(target) = objects.get(&stored.old_id) {
                let new_id = target.borrow().id();
                stored.attr.set_value(
                    &mut *stored.object.borrow_mut(),
                    AttributeValue::ObjectRef(ObjectRef::new(new_id)),
                );
            } else {
                log::warn!("Could not resolve object reference {}", stored.old_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::ptr::SharedPtr;
    use crate::foundation::string_hash::StringHash;
    use crate::object::factory::ObjectType;
    use crate::io::{Stream, VectorBuffer};
    use crate::object::serializable::{self, register_attribute, Serializable};
    use crate::object_type;
    use std::any::Any;

    #[derive(Default)]
    struct LinkNode {
        id: u32,
        target: ObjectRef,
    }

    object_type!(LinkNode);

    impl Serializable for LinkNode {
        fn object_type(&self) -> StringHash {
            Self::static_type()
        }

        fn type_name(&self) -> &'static str {
            Self::static_type_name()
        }

        fn id(&self) -> u32 {
            self.id
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl LinkNode {
        fn register() {
            register_attribute::<Self, ObjectRef>(
                "target",
                |n| n.target,
                |n, v| n.target = v,
                ObjectRef::null(),
            );
        }

        fn with_id(id: u32) -> SharedPtr<Self> {
            SharedPtr::new(Self {
                id,
                ..Self::default()
            })
        }
    }

    #[test]
    fn test_references_resolve_to_new_ids() {
        LinkNode::register();

        // Old ids 10/20/30 in the serialized data; a references c, c
        // references b.
        let a = LinkNode::with_id(1);
        let b = LinkNode::with_id(2);
        let c = LinkNode::with_id(3);

        let mut resolver = ObjectResolver::new();
        resolver.store_object(10, a.to_handle());
        resolver.store_object(20, b.to_handle());
        resolver.store_object(30, c.to_handle());

        let attr = a.borrow().find_attribute("target").unwrap();
        resolver.store_object_ref(a.to_handle(), Arc::clone(&attr), ObjectRef::new(30));
        resolver.store_object_ref(c.to_handle(), attr, ObjectRef::new(20));
        resolver.resolve();

        assert_eq!(a.borrow().target, ObjectRef::new(3));
        assert_eq!(c.borrow().target, ObjectRef::new(2));
        assert_eq!(b.borrow().target, ObjectRef::null());
    }

    #[test]
    fn test_unresolved_reference_keeps_field() {
        LinkNode::register();

        let a = LinkNode::with_id(1);
        let mut resolver = ObjectResolver::new();
        resolver.store_object(10, a.to_handle());

        let attr = a.borrow().find_attribute("target").unwrap();
        resolver.store_object_ref(a.to_handle(), attr, ObjectRef::new(999));
        resolver.resolve();

        assert_eq!(a.borrow().target, ObjectRef::null());
    }

    #[test]
    fn test_self_reference() {
        LinkNode::register();

        let a = LinkNode::with_id(5);
        let mut resolver = ObjectResolver::new();
        resolver.store_object(77, a.to_handle());

        let attr = a.borrow().find_attribute("target").unwrap();
        resolver.store_object_ref(a.to_handle(), attr, ObjectRef::new(77));
        resolver.resolve();

        assert_eq!(a.borrow().target, ObjectRef::new(5));
    }

    #[test]
    fn test_colliding_store_is_last_write_wins() {
        LinkNode::register();

        let first = LinkNode::with_id(1);
        let second = LinkNode::with_id(2);
        let observer = LinkNode::with_id(3);

        let mut resolver = ObjectResolver::new();
        resolver.store_object(10, first.to_handle());
        resolver.store_object(10, second.to_handle());

        let attr = observer.borrow().find_attribute("target").unwrap();
        resolver.store_object_ref(observer.to_handle(), attr, ObjectRef::new(10));
        resolver.resolve();

        assert_eq!(observer.borrow().target, ObjectRef::new(2));
    }

    #[test]
    fn test_deferred_capture_through_binary_load() {
        LinkNode::register();

        // Serialize a node that points at old id 42.
        let source = LinkNode::with_id(1);
        source.borrow_mut().target = ObjectRef::new(42);
        let mut buffer = VectorBuffer::new();
        serializable::save(&*source.borrow(), &mut buffer).unwrap();

        // While loading, the reference must not be applied before resolve
        // runs, even though the attribute bytes were already consumed.
        let loaded = LinkNode::with_id(7);
        let referenced = LinkNode::with_id(9);
        let mut resolver = ObjectResolver::new();
        buffer.seek(0).unwrap();
        serializable::load(&loaded.to_handle(), &mut buffer, &mut resolver).unwrap();
        assert_eq!(loaded.borrow().target, ObjectRef::null());

        resolver.store_object(42, referenced.to_handle());
        resolver.resolve();
        assert_eq!(loaded.borrow().target, ObjectRef::new(9));
    }
}
