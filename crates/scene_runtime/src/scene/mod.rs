//! Scene graph and scene persistence built on the serializable object
//! framework.

pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;

pub use node::Node;
pub use scene::{Scene, SceneError};
