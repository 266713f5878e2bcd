//! Scene: root of the node hierarchy and its persistence
//!
//! The scene owns the root node, hands out ascending node ids and keeps an
//! id-to-node map for lookups. Persistence walks the hierarchy: each node
//! is written as its type hash and id, its attributes, then its persistent
//! children. Loading creates nodes through the object factory, assigns
//! fresh local ids and routes every object reference through an
//! [`ObjectResolver`] scoped to the load pass, so references written
//! against the old ids land on the right nodes even though everything has
//! been renumbered. A child of an unknown type is skipped positionally
//! without desyncing its siblings.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::foundation::ptr::{SharedPtr, WeakPtr};
use crate::foundation::string_hash::StringHash;
use crate::io::{Stream, StreamError};
use crate::object::factory::{create_object, ObjectType};
use crate::object::resolver::ObjectResolver;
use crate::object::serializable::{self, Serializable};
use crate::scene::node::Node;

/// Binary scene file identifier.
const SCENE_FILE_ID: &str = "SCNE";

/// Errors produced by scene persistence.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The data does not start with the scene file identifier.
    #[error("file is not a binary scene file")]
    InvalidFileId,

    /// The root node in the data has an unexpected type.
    #[error("mismatching type of scene root node")]
    RootTypeMismatch,

    /// The JSON data is not an object.
    #[error("scene data is not a JSON object")]
    MalformedJson,

    /// Underlying stream failure.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// The JSON text could not be parsed.
    #[error("could not parse scene JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scene graph root with node id bookkeeping and persistence.
pub struct Scene {
    root: SharedPtr<Node>,
    nodes: HashMap<u32, WeakPtr<Node>>,
    next_id: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with a root node of id 1.
    pub fn new() -> Self {
        let root = SharedPtr::new(Node::new("Root"));
        root.borrow_mut().set_id(1);
        let mut nodes = HashMap::new();
        nodes.insert(1, root.downgrade());
        Self {
            root,
            nodes,
            next_id: 2,
        }
    }

    /// The root node.
    pub fn root(&self) -> SharedPtr<Node> {
        self.root.clone()
    }

    /// Number of nodes known to the scene, the root included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Create a named child node under a parent already in this scene.
    pub fn create_child(&mut self, parent: &SharedPtr<Node>, name: &str) -> SharedPtr<Node> {
        let child = SharedPtr::new(Node::new(name));
        self.adopt(parent, child.clone());
        child
    }

    /// Attach an externally created node under a parent, assigning it a
    /// fresh id in this scene.
    pub fn adopt(&mut self, parent: &SharedPtr<Node>, child: SharedPtr<Node>) {
        self.assign_id(&child);
        Node::add_child(parent, child);
    }

    /// Detach a child node and forget the ids of its whole subtree.
    pub fn remove_child(&mut self, parent: &SharedPtr<Node>, child: &SharedPtr<Node>) -> bool {
        if Node::remove_child(parent, child) {
            self.unregister_subtree(child);
            true
        } else {
            false
        }
    }

    /// Look up a node by id.
    pub fn find_node(&self, id: u32) -> Option<SharedPtr<Node>> {
        self.nodes.get(&id)?.upgrade()
    }

    /// Remove every node except the root and reset id assignment.
    pub fn clear(&mut self) {
        Node::remove_all_children(&self.root);
        self.nodes.clear();
        self.nodes.insert(1, self.root.downgrade());
        self.root.borrow_mut().set_id(1);
        self.next_id = 2;
    }

    fn assign_id(&mut self, node: &SharedPtr<Node>) {
        while self.nodes.contains_key(&self.next_id) {
            self.next_id += 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        node.borrow_mut().set_id(id);
        self.nodes.insert(id, node.downgrade());
    }

    fn unregister_subtree(&mut self, node: &SharedPtr<Node>) {
        self.nodes.remove(&node.borrow().node_id());
        let children = node.borrow().children().to_vec();
        for child in children {
            self.unregister_subtree(&child);
        }
    }

    /// Save the scene to a binary stream.
    pub fn save(&self, dest: &mut dyn Stream) -> Result<(), SceneError> {
        log::info!("Saving scene");
        dest.write_file_id(SCENE_FILE_ID)?;
        Self::save_hierarchy(&self.root, dest)
    }

    /// Load the scene from a binary stream written by [`save`](Self::save),
    /// replacing the current content.
    pub fn load(&mut self, source: &mut dyn Stream) -> Result<(), SceneError> {
        log::info!("Loading scene");
        let file_id = source.read_file_id()?;
        if file_id != SCENE_FILE_ID {
            log::error!("File is not a binary scene file");
            return Err(SceneError::InvalidFileId);
        }

        let root_type = StringHash(source.read_u32()?);
        let root_id = source.read_u32()?;
        if root_type != Node::static_type() {
            log::error!("Mismatching type of scene root node");
            return Err(SceneError::RootTypeMismatch);
        }

        self.clear();
        let root = self.root();
        let mut resolver = ObjectResolver::new();
        resolver.store_object(root_id, root.to_handle());
        serializable::load(&root.to_handle(), source, &mut resolver)?;
        self.load_children(&root, source, &mut resolver)?;
        resolver.resolve();
        Ok(())
    }

    /// Save a node and its persistent subtree to a binary stream. Used for
    /// whole scenes and for subtrees fed to [`instantiate`](Self::instantiate).
    pub fn save_hierarchy(node: &SharedPtr<Node>, dest: &mut dyn Stream) -> Result<(), SceneError> {
        let guard = node.borrow();
        dest.write_u32(guard.object_type().value())?;
        dest.write_u32(guard.node_id())?;
        serializable::save(&*guard, dest)?;
        dest.write_vle(guard.num_persistent_children() as u32)?;
        let children = guard.children().to_vec();
        drop(guard);

        for child in children {
            if !child.borrow().is_temporary() {
                Self::save_hierarchy(&child, dest)?;
            }
        }
        Ok(())
    }

    fn load_children(
        &mut self,
        parent: &SharedPtr<Node>,
        source: &mut dyn Stream,
        resolver: &mut ObjectResolver,
    ) -> Result<(), SceneError> {
        let count = source.read_vle()?;
        for _ in 0..count {
            let child_type = StringHash(source.read_u32()?);
            let child_id = source.read_u32()?;

            let child = create_object(child_type).dynamic_cast::<Node>();
            if child.is_null() {
                log::warn!("Skipping child node of unknown type {child_type}");
                Self::skip_hierarchy(source)?;
                continue;
            }

            self.adopt(parent, child.clone());
            resolver.store_object(child_id, child.to_handle());
            serializable::load(&child.to_handle(), source, resolver)?;
            self.load_children(&child, source, resolver)?;
        }
        Ok(())
    }

    /// Advance a binary stream past one node record and its subtree.
    fn skip_hierarchy(source: &mut dyn Stream) -> Result<(), SceneError> {
        serializable::skip(source)?;
        let count = source.read_vle()?;
        for _ in 0..count {
            source.read_u32()?;
            source.read_u32()?;
            Self::skip_hierarchy(source)?;
        }
        Ok(())
    }

    /// Load one serialized subtree under a parent with its own resolver
    /// scope, renumbering its ids into this scene. Returns a null handle
    /// when the subtree's root type is unknown.
    pub fn instantiate(
        &mut self,
        parent: &SharedPtr<Node>,
        source: &mut dyn Stream,
    ) -> Result<SharedPtr<Node>, SceneError> {
        let mut resolver = ObjectResolver::new();
        let child_type = StringHash(source.read_u32()?);
        let child_id = source.read_u32()?;

        let child = create_object(child_type).dynamic_cast::<Node>();
        if child.is_null() {
            log::error!("Could not instantiate node, unknown type {child_type}");
            Self::skip_hierarchy(source)?;
            return Ok(SharedPtr::null());
        }

        self.adopt(parent, child.clone());
        resolver.store_object(child_id, child.to_handle());
        serializable::load(&child.to_handle(), source, &mut resolver)?;
        self.load_children(&child, source, &mut resolver)?;
        resolver.resolve();
        Ok(child)
    }

    /// Save the scene as a JSON value tree.
    pub fn save_json_value(&self) -> Value {
        Self::save_hierarchy_json(&self.root)
    }

    /// Save the scene as pretty-printed JSON text.
    pub fn save_json(&self, dest: &mut dyn Stream) -> Result<(), SceneError> {
        log::info!("Saving scene as JSON");
        let text = serde_json::to_vec_pretty(&self.save_json_value())?;
        dest.write_exact(&text)?;
        Ok(())
    }

    /// Load the scene from a JSON value tree, replacing the current
    /// content.
    pub fn load_json_value(&mut self, source: &Value) -> Result<(), SceneError> {
        let map = source.as_object().ok_or(SceneError::MalformedJson)?;
        let type_name = map.get("type").and_then(Value::as_str).unwrap_or_default();
        if StringHash::of(type_name) != Node::static_type() {
            log::error!("Mismatching type of scene root node");
            return Err(SceneError::RootTypeMismatch);
        }
        let root_id = id_from_json(map.get("id"));

        self.clear();
        let root = self.root();
        let mut resolver = ObjectResolver::new();
        resolver.store_object(root_id, root.to_handle());
        serializable::load_json(&root.to_handle(), source, &mut resolver);
        self.load_children_json(&root, source, &mut resolver);
        resolver.resolve();
        Ok(())
    }

    /// Load the scene from JSON text in a stream.
    pub fn load_json(&mut self, source: &mut dyn Stream) -> Result<(), SceneError> {
        log::info!("Loading scene from JSON");
        let mut data = vec![0u8; source.size().saturating_sub(source.position())];
        source.read_exact(&mut data)?;
        let value: Value = serde_json::from_slice(&data)?;
        self.load_json_value(&value)
    }

    fn save_hierarchy_json(node: &SharedPtr<Node>) -> Value {
        let guard = node.borrow();
        let mut value = serializable::save_json(&*guard);
        if let Some(map) = value.as_object_mut() {
            map.insert("type".to_string(), Value::from(guard.type_name()));
            map.insert("id".to_string(), Value::from(guard.node_id()));
        }
        let children = guard.children().to_vec();
        drop(guard);

        let persistent: Vec<Value> = children
            .iter()
            .filter(|c| !c.borrow().is_temporary())
            .map(Self::save_hierarchy_json)
            .collect();
        if !persistent.is_empty() {
            if let Some(map) = value.as_object_mut() {
                map.insert("children".to_string(), Value::Array(persistent));
            }
        }
        value
    }

    fn load_children_json(
        &mut self,
        parent: &SharedPtr<Node>,
        source: &Value,
        resolver: &mut ObjectResolver,
    ) {
        let Some(children) = source.get("children").and_then(Value::as_array) else {
            return;
        };
        for child_value in children {
            let Some(child_map) = child_value.as_object() else {
                continue;
            };
            let type_name = child_map.get("type").and_then(Value::as_str).unwrap_or_default();

            let child = create_object(StringHash::of(type_name)).dynamic_cast::<Node>();
            if child.is_null() {
                log::warn!("Skipping child node of unknown type {type_name:?}");
                continue;
            }

            self.adopt(parent, child.clone());
            resolver.store_object(id_from_json(child_map.get("id")), child.to_handle());
            serializable::load_json(&child.to_handle(), child_value, resolver);
            self.load_children_json(&child, child_value, resolver);
        }
    }

    /// Load one JSON subtree under a parent with its own resolver scope.
    /// Returns a null handle when the subtree's root type is unknown.
    pub fn instantiate_json(
        &mut self,
        parent: &SharedPtr<Node>,
        source: &Value,
    ) -> Result<SharedPtr<Node>, SceneError> {
        let map = source.as_object().ok_or(SceneError::MalformedJson)?;
        let type_name = map.get("type").and_then(Value::as_str).unwrap_or_default();

        let child = create_object(StringHash::of(type_name)).dynamic_cast::<Node>();
        if child.is_null() {
            log::error!("Could not instantiate node, unknown type {type_name:?}");
            return Ok(SharedPtr::null());
        }

        let mut resolver = ObjectResolver::new();
        self.adopt(parent, child.clone());
        resolver.store_object(id_from_json(map.get("id")), child.to_handle());
        serializable::load_json(&child.to_handle(), source, &mut resolver);
        self.load_children_json(&child, source, &mut resolver);
        resolver.resolve();
        Ok(child)
    }
}

fn id_from_json(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::io::VectorBuffer;
    use crate::object::serializable::class_attributes;

    fn build_scene() -> Scene {
        Node::register();
        let mut scene = Scene::new();
        let root = scene.root();

        let player = scene.create_child(&root, "player");
        player.borrow_mut().set_position(Vec3::new(1.0, 2.0, 3.0));
        player.borrow_mut().set_layer(4);

        let camera = scene.create_child(&player, "camera");
        camera.borrow_mut().set_position(Vec3::new(0.0, 1.5, -4.0));

        let props = scene.create_child(&root, "props");
        props.borrow_mut().set_enabled(false);
        scene
    }

    #[test]
    fn test_id_assignment_and_lookup() {
        let scene = build_scene();
        assert_eq!(scene.root().borrow().node_id(), 1);
        assert_eq!(scene.num_nodes(), 4);

        let player = scene.find_node(2).unwrap();
        assert_eq!(player.borrow().name(), "player");
        assert!(scene.find_node(99).is_none());
    }

    #[test]
    fn test_remove_child_forgets_subtree_ids() {
        let mut scene = build_scene();
        let root = scene.root();
        let player = Node::find_child(&root, "player", false).unwrap();

        assert!(scene.remove_child(&root, &player));
        // player (2) and camera (3) are gone, props (4) remains.
        assert_eq!(scene.num_nodes(), 2);
        assert!(scene.find_node(2).is_none());
        assert!(scene.find_node(3).is_none());
        assert!(scene.find_node(4).is_some());
    }

    #[test]
    fn test_binary_round_trip() {
        let scene = build_scene();
        let mut buffer = VectorBuffer::new();
        scene.save(&mut buffer).unwrap();

        let mut restored = Scene::new();
        buffer.seek(0).unwrap();
        restored.load(&mut buffer).unwrap();
        assert!(buffer.is_eof());

        assert_eq!(restored.num_nodes(), 4);
        let root = restored.root();
        assert_eq!(root.borrow().children().len(), 2);

        let player = Node::find_child(&root, "player", false).unwrap();
        assert_eq!(player.borrow().position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(player.borrow().layer(), 4);

        let camera = Node::find_child(&player, "camera", false).unwrap();
        assert_eq!(camera.borrow().position(), Vec3::new(0.0, 1.5, -4.0));
        assert_eq!(camera.borrow().parent().unwrap(), player);

        let props = Node::find_child(&root, "props", false).unwrap();
        assert!(!props.borrow().is_enabled());
    }

    #[test]
    fn test_json_round_trip() {
        let scene = build_scene();
        let encoded = scene.save_json_value();

        let mut restored = Scene::new();
        restored.load_json_value(&encoded).unwrap();

        assert_eq!(restored.num_nodes(), 4);
        let root = restored.root();
        let player = Node::find_child(&root, "player", false).unwrap();
        assert_eq!(player.borrow().position(), Vec3::new(1.0, 2.0, 3.0));
        assert!(Node::find_child(&player, "camera", false).is_some());
    }

    #[test]
    fn test_json_text_round_trip_through_stream() {
        let scene = build_scene();
        let mut buffer = VectorBuffer::new();
        scene.save_json(&mut buffer).unwrap();

        let mut restored = Scene::new();
        buffer.seek(0).unwrap();
        restored.load_json(&mut buffer).unwrap();
        assert_eq!(restored.num_nodes(), 4);
    }

    #[test]
    fn test_default_attributes_omitted_from_json() {
        Node::register();
        let mut scene = Scene::new();
        let root = scene.root();
        scene.create_child(&root, "plain");

        let encoded = scene.save_json_value();
        let child = &encoded["children"][0];
        assert_eq!(child["name"], "plain");
        assert!(child.get("enabled").is_none());
        assert!(child.get("position").is_none());
    }

    #[test]
    fn test_temporary_nodes_not_persisted() {
        let mut scene = build_scene();
        let root = scene.root();
        let scratch = scene.create_child(&root, "scratch");
        scratch.borrow_mut().set_temporary(true);

        let mut buffer = VectorBuffer::new();
        scene.save(&mut buffer).unwrap();

        let mut restored = Scene::new();
        buffer.seek(0).unwrap();
        restored.load(&mut buffer).unwrap();
        assert!(Node::find_child(&restored.root(), "scratch", true).is_none());
        assert_eq!(restored.num_nodes(), 4);
    }

    #[test]
    fn test_unknown_child_type_is_skipped() {
        Node::register();

        // Hand-written scene data: root with two children, the first of an
        // unregistered type, the second a regular node.
        let mut buffer = VectorBuffer::new();
        buffer.write_file_id(SCENE_FILE_ID).unwrap();
        buffer.write_u32(Node::static_type().value()).unwrap();
        buffer.write_u32(1).unwrap();
        let root_node = SharedPtr::new(Node::new("Root"));
        serializable::save(&*root_node.borrow(), &mut buffer).unwrap();
        buffer.write_vle(2).unwrap();

        // Unknown child: type, id, one int attribute, no children.
        buffer.write_u32(StringHash::of("MysteryWidget").value()).unwrap();
        buffer.write_u32(2).unwrap();
        buffer.write_vle(1).unwrap();
        buffer
            .write_u8(crate::object::attribute::AttributeType::Int.tag())
            .unwrap();
        buffer.write_i32(-5).unwrap();
        buffer.write_vle(0).unwrap();

        // Known child.
        let survivor = SharedPtr::new(Node::new("survivor"));
        Scene::save_hierarchy(&survivor, &mut buffer).unwrap();

        let mut scene = Scene::new();
        buffer.seek(0).unwrap();
        scene.load(&mut buffer).unwrap();
        assert!(buffer.is_eof());

        let root = scene.root();
        assert_eq!(root.borrow().children().len(), 1);
        assert_eq!(root.borrow().children()[0].borrow().name(), "survivor");
    }

    #[test]
    fn test_instantiate_renumbers_ids() {
        let mut scene = build_scene();
        let root = scene.root();
        let player = Node::find_child(&root, "player", false).unwrap();

        let mut buffer = VectorBuffer::new();
        Scene::save_hierarchy(&player, &mut buffer).unwrap();

        // Instantiating the same subtree again creates a sibling copy with
        // fresh ids.
        buffer.seek(0).unwrap();
        let copy = scene.instantiate(&root, &mut buffer).unwrap();
        assert!(!copy.is_null());
        assert_eq!(copy.borrow().name(), "player");
        assert_ne!(copy.borrow().node_id(), player.borrow().node_id());
        assert_eq!(scene.num_nodes(), 6);
        assert!(Node::find_child(&copy, "camera", false).is_some());
    }

    #[test]
    fn test_instantiate_json() {
        let mut scene = build_scene();
        let root = scene.root();

        let encoded = scene.save_json_value();
        let player_json = encoded["children"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == "player")
            .unwrap()
            .clone();

        let copy = scene.instantiate_json(&root, &player_json).unwrap();
        assert!(!copy.is_null());
        assert_eq!(copy.borrow().name(), "player");
        assert!(Node::find_child(&copy, "camera", false).is_some());
        assert_eq!(scene.num_nodes(), 6);

        let unknown = scene
            .instantiate_json(&root, &serde_json::json!({"type": "Mystery", "id": 9}))
            .unwrap();
        assert!(unknown.is_null());
    }

    #[test]
    fn test_load_rejects_bad_header() {
        Node::register();
        let mut scene = Scene::new();

        let mut buffer = VectorBuffer::new();
        buffer.write_file_id("JUNK").unwrap();
        buffer.seek(0).unwrap();
        assert!(matches!(
            scene.load(&mut buffer),
            Err(SceneError::InvalidFileId)
        ));

        let mut buffer = VectorBuffer::new();
        buffer.write_file_id(SCENE_FILE_ID).unwrap();
        buffer.write_u32(StringHash::of("NotANode").value()).unwrap();
        buffer.write_u32(1).unwrap();
        buffer.seek(0).unwrap();
        assert!(matches!(
            scene.load(&mut buffer),
            Err(SceneError::RootTypeMismatch)
        ));
    }

    #[test]
    fn test_node_attributes_registered_once() {
        Node::register();
        Node::register();
        let attrs = class_attributes(Node::static_type()).unwrap();
        let names: Vec<_> = attrs.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["name", "enabled", "layer", "tag", "position", "rotation", "scale"]
        );
    }
}
