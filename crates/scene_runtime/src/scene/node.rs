//! Scene graph node
//!
//! Nodes form the scene hierarchy: each node strongly owns its children and
//! weakly observes its parent, so dropping a subtree tears it down without
//! reference cycles. Name, enabled state, layer, tag and the local
//! transform are registered attributes, which is all the persistence layer
//! needs to round-trip a node.

use std::any::Any;

use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::foundation::ptr::{SharedPtr, WeakPtr};
use crate::foundation::string_hash::StringHash;
use crate::object::factory::register_factory;
use crate::object::factory::ObjectType;
use crate::object::serializable::{register_attribute, Serializable};
use crate::object_type;

/// Named, identified node in the scene hierarchy.
pub struct Node {
    name: String,
    id: u32,
    enabled: bool,
    temporary: bool,
    layer: u8,
    tag: u8,
    transform: Transform,
    parent: WeakPtr<Node>,
    children: Vec<SharedPtr<Node>>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            enabled: true,
            temporary: false,
            layer: 0,
            tag: 0,
            transform: Transform::identity(),
            parent: WeakPtr::null(),
            children: Vec::new(),
        }
    }
}

object_type!(Node);

impl Serializable for Node {
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

impl Node {
    /// Register the factory and attributes. Call once at startup before
    /// scenes are loaded or saved; calling again is harmless.
    pub fn register() {
        register_factory::<Self>();
        register_attribute::<Self, String>(
            "name",
            |n| n.name.clone(),
            |n, v| n.name = v,
            String::new(),
        );
        register_attribute::<Self, bool>("enabled", |n| n.enabled, |n, v| n.enabled = v, true);
        register_attribute::<Self, u8>("layer", |n| n.layer, |n, v| n.layer = v, 0);
        register_attribute::<Self, u8>("tag", |n| n.tag, |n, v| n.tag = v, 0);
        register_attribute::<Self, Vec3>(
            "position",
            |n| n.transform.position,
            |n, v| n.transform.position = v,
            Vec3::zeros(),
        );
        register_attribute::<Self, Quat>(
            "rotation",
            |n| n.transform.rotation,
            |n, v| n.transform.rotation = v,
            Quat::identity(),
        );
        register_attribute::<Self, Vec3>(
            "scale",
            |n| n.transform.scale,
            |n, v| n.transform.scale = v,
            Vec3::new(1.0, 1.0, 1.0),
        );
    }

    /// Create a named node outside any scene.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Scene-assigned id, 0 while outside a scene.
    pub fn node_id(&self) -> u32 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Whether the node is enabled. Disabled nodes stay in the hierarchy
    /// but are meant to be ignored by systems walking it.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the node.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the node is excluded from persistence.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Exclude or include the node in persistence.
    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// Layer index.
    pub fn layer(&self) -> u8 {
        self.layer
    }

    /// Assign the layer index.
    pub fn set_layer(&mut self, layer: u8) {
        self.layer = layer;
    }

    /// Tag index.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Assign the tag index.
    pub fn set_tag(&mut self, tag: u8) {
        self.tag = tag;
    }

    /// Local position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Set the local position.
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    /// Local rotation.
    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    /// Set the local rotation.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    /// Local scale.
    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    /// Set the local scale.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    /// Local transform matrix composed from position, rotation and scale.
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Child nodes.
    pub fn children(&self) -> &[SharedPtr<Node>] {
        &self.children
    }

    /// Parent node, or `None` for a root or detached node.
    pub fn parent(&self) -> Option<SharedPtr<Node>> {
        self.parent.upgrade()
    }

    /// Number of children included in persistence.
    pub fn num_persistent_children(&self) -> usize {
        self.children
            .iter()
            .filter(|c| !c.borrow().is_temporary())
            .count()
    }

    /// Attach a child node, detaching it from its previous parent first.
    /// Attaching a node to itself is ignored.
    pub fn add_child(parent: &SharedPtr<Node>, child: SharedPtr<Node>) {
        if parent.is_null() || child.is_null() || *parent == child {
            return;
        }
        let old_parent = child.borrow().parent();
        if let Some(old_parent) = old_parent {
            Self::remove_child(&old_parent, &child);
        }
        child.borrow_mut().parent = parent.downgrade();
        parent.borrow_mut().children.push(child);
    }

    /// Detach a child node. Returns false when `child` is not a child of
    /// `parent`.
    pub fn remove_child(parent: &SharedPtr<Node>, child: &SharedPtr<Node>) -> bool {
        if parent.is_null() || child.is_null() {
            return false;
        }
        let removed = {
            let mut guard = parent.borrow_mut();
            match guard.children.iter().position(|c| c == child) {
                Some(index) => {
                    guard.children.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            child.borrow_mut().parent = WeakPtr::null();
        }
        removed
    }

    /// Detach all children of a node.
    pub fn remove_all_children(parent: &SharedPtr<Node>) {
        let children = std::mem::take(&mut parent.borrow_mut().children);
        for child in children {
            child.borrow_mut().parent = WeakPtr::null();
        }
    }

    /// Find a child by name, optionally searching the whole subtree.
    pub fn find_child(
        parent: &SharedPtr<Node>,
        name: &str,
        recursive: bool,
    ) -> Option<SharedPtr<Node>> {
        let children = parent.borrow().children.to_vec();
        for child in &children {
            if child.borrow().name == name {
                return Some(child.clone());
            }
        }
        if recursive {
            for child in &children {
                if let Some(found) = Self::find_child(child, name, true) {
                    return Some(found);
                }
            }
        }
        None
    }
}
