//! Scene round-trip demo
//!
//! Builds a small scene hierarchy, saves it through both the binary and
//! JSON formats, reloads each and reports what came back. Run with
//! `RUST_LOG=info` to see the steps. An optional `scene_demo.toml` next to
//! the working directory overrides the demo settings.

use scene_runtime::config::Config;
use scene_runtime::foundation::logging;
use scene_runtime::foundation::math::Vec3;
use scene_runtime::io::{Stream, VectorBuffer};
use scene_runtime::scene::{Node, Scene};
use serde::{Deserialize, Serialize};

/// Demo settings, optionally loaded from `scene_demo.toml`.
#[derive(Debug, Serialize, Deserialize)]
struct DemoConfig {
    /// Number of crate stacks to spawn under the root.
    stack_count: u32,
    /// Print the JSON form of the scene to stdout.
    print_json: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            stack_count: 3,
            print_json: true,
        }
    }
}

impl Config for DemoConfig {}

fn build_scene(config: &DemoConfig) -> Scene {
    let mut scene = Scene::new();
    let root = scene.root();

    let player = scene.create_child(&root, "player");
    player.borrow_mut().set_position(Vec3::new(0.0, 1.0, 0.0));

    let camera = scene.create_child(&player, "camera");
    camera.borrow_mut().set_position(Vec3::new(0.0, 1.5, -6.0));

    for index in 0..config.stack_count {
        let stack = scene.create_child(&root, &format!("stack_{index}"));
        stack
            .borrow_mut()
            .set_position(Vec3::new(index as f32 * 2.0, 0.0, 4.0));
        scene.create_child(&stack, "crate_top");
    }

    scene
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match DemoConfig::load_from_file("scene_demo.toml") {
        Ok(config) => config,
        Err(_) => DemoConfig::default(),
    };
    log::info!("Demo settings: {config:?}");

    Node::register();
    let scene = build_scene(&config);
    log::info!("Built a scene with {} nodes", scene.num_nodes());

    // Binary round trip.
    let mut buffer = VectorBuffer::new();
    scene.save(&mut buffer)?;
    log::info!("Binary scene size: {} bytes", buffer.size());

    let mut restored = Scene::new();
    buffer.seek(0)?;
    restored.load(&mut buffer)?;
    log::info!("Reloaded {} nodes from binary", restored.num_nodes());

    let camera = Node::find_child(&restored.root(), "camera", true)
        .ok_or("camera missing after binary reload")?;
    log::info!("Restored camera position: {:?}", camera.borrow().position());

    // JSON round trip.
    let encoded = scene.save_json_value();
    let mut from_json = Scene::new();
    from_json.load_json_value(&encoded)?;
    log::info!("Reloaded {} nodes from JSON", from_json.num_nodes());

    if config.print_json {
        println!("{}", serde_json::to_string_pretty(&encoded)?);
    }

    Ok(())
}
