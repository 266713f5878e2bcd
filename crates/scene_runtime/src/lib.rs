//! # Scene Runtime
//!
//! Object and scene runtime layer for a real-time 3D engine:
//!
//! - **Reference counting**: [`SharedPtr`]/[`WeakPtr`] handles over a shared
//!   strong/weak count cell with an explicit expiry flag
//!   ([`foundation::ptr`]).
//! - **Attributes**: per-class registration of named, typed, serializable
//!   fields, round-tripped losslessly through a positional binary format and
//!   a name-keyed JSON format ([`object::attribute`],
//!   [`object::serializable`]).
//! - **Deferred reference resolution**: object-to-object links discovered
//!   while loading are patched in a second pass once the whole graph exists
//!   ([`object::resolver`]).
//! - **Scene graph**: named, identified nodes with transform attributes and
//!   full binary/JSON scene persistence built on the pieces above
//!   ([`scene`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_runtime::prelude::*;
//!
//! Node::register();
//!
//! let mut scene = Scene::new();
//! let root = scene.root();
//! let child = scene.create_child(&root, "player");
//! child.borrow_mut().set_position(Vec3::new(0.0, 1.0, 0.0));
//!
//! let mut buffer = VectorBuffer::new();
//! scene.save(&mut buffer).unwrap();
//!
//! let mut restored = Scene::new();
//! buffer.seek(0).unwrap();
//! restored.load(&mut buffer).unwrap();
//! assert_eq!(restored.root().borrow().children().len(), 1);
//! ```
//!
//! Reference counts are plain integers without atomic protection; a given
//! object graph must stay confined to one thread.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod io;
pub mod object;
pub mod scene;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        foundation::{
            math::{BoundingBox, Color, IntRect, IntVector2, Mat3, Mat3x4, Mat4, Quat, Rect,
                   TextCodec, Transform, Vec2, Vec3, Vec4},
            ptr::{SharedPtr, WeakPtr},
            string_hash::StringHash,
        },
        io::{
            MemoryBuffer, ObjectRef, ResourceRef, ResourceRefList, Stream, StreamError,
            VectorBuffer,
        },
        object::{
            attribute::{Attribute, AttributeType, AttributeValue},
            factory::{create_object, register_factory, ObjectType},
            resolver::ObjectResolver,
            serializable::{ObjectHandle, Serializable},
        },
        scene::{Node, Scene, SceneError},
    };
}
