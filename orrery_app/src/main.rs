//! Orrery demo application
//!
//! A headless model solar system exercising the scene graph runtime: nested
//! transform nodes spin planets and moons, a shared moon definition orbits
//! two planets at once, a cull list computes visibility, and a draw list
//! commits the visible set each frame.

use scene_engine::prelude::*;
use scene_engine::scene::{AddNodeContext, DrawCommand, EntryStore, ItemData};

use std::f32::consts::TAU;

/// Draw list committing every visible cull node.
struct BodyDrawList {
    name: String,
    entries: EntryStore<TreeNodeKey>,
    worlds: std::collections::HashMap<EntryId, Mat4>,
    visibility: VisibilitySet,
}

impl BodyDrawList {
    fn new(name: &str, visibility: VisibilitySet) -> Self {
        Self {
            name: name.to_string(),
            entries: EntryStore::new(),
            worlds: std::collections::HashMap::new(),
            visibility,
        }
    }
}

impl ItemList for BodyDrawList {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_node(&mut self, ctx: AddNodeContext<'_>) -> Option<(EntryId, Option<ItemData>)> {
        // Draw whatever participates in culling.
        ctx.node.payload::<CullNode>()?;
        let entry = self.entries.insert(ctx.key);
        self.worlds.insert(entry, *ctx.world);
        Some((entry, None))
    }

    fn update_node(&mut self, entry: EntryId, _key: TreeNodeKey, world: &Mat4) {
        self.worlds.insert(entry, *world);
    }

    fn remove_node(&mut self, entry: EntryId) {
        self.entries.defer_remove(entry);
        self.worlds.remove(&entry);
    }

    fn pre_transform_update(&mut self, _delta_time: f32) {
        self.entries.flush_removals();
    }

    fn commit(&mut self, _view: &View, commands: &mut RenderCommandBuffer) {
        for (entry, key) in self.entries.iter() {
            if !self.visibility.is_visible(*key) {
                continue;
            }
            let Some(world) = self.worlds.get(&entry) else {
                continue;
            };
            commands.draw(DrawCommand {
                list: self.name.clone(),
                entry,
                transform: *world,
            });
        }
    }
}

fn orbit_transform(radius: f32, angle: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin()))
}

fn body(name_lists: &[&str], radius: f32) -> NodeRef {
    CullNode::new(
        Aabb::from_center_extents(Vec3::zeros(), Vec3::new(radius, radius, radius)),
        name_lists,
    )
}

fn main() -> Result<(), SceneError> {
    env_logger::init();
    log::info!("Starting orrery demo...");

    let (cull_list, visibility) = CullList::new("culling");
    let draw_list = BodyDrawList::new("bodies", visibility.clone());

    let mut scene = Scene::builder()
        .shared_tier(vec![Box::new(cull_list)])
        .render_pass("forward", vec![Box::new(draw_list)])
        .build()?;

    // Sun at the origin; two planets on orbit pivots; one shared moon
    // definition attached under both planets, realized independently.
    let sun = body(&["culling", "bodies"], 2.0);
    scene.add_root(&sun)?;

    let inner_orbit = TransformNode::new(orbit_transform(6.0, 0.0));
    let outer_orbit = TransformNode::new(orbit_transform(11.0, 0.0));
    scene.add_root(&inner_orbit)?;
    scene.add_root(&outer_orbit)?;

    let inner_planet = body(&["culling", "bodies"], 0.8);
    let outer_planet = body(&["culling", "bodies"], 1.2);
    scene.add_child(&inner_orbit, &inner_planet)?;
    scene.add_child(&outer_orbit, &outer_planet)?;

    let moon_orbit = TransformNode::new(orbit_transform(2.0, 0.0));
    let moon = body(&["culling", "bodies"], 0.3);
    scene.add_child(&moon_orbit, &moon)?;
    scene.add_child(&inner_orbit, &moon_orbit)?;
    scene.add_child(&outer_orbit, &moon_orbit)?;
    log::info!(
        "Scene built: {} roots, {} tree nodes, moon realized {} time(s)",
        scene.root_count(),
        scene.tree_node_count(),
        moon.tree_node_count()
    );

    let mut view = View::new(1280, 720);
    view.set_camera(
        Mat4::identity(),
        Mat4::new_orthographic(-10.0, 10.0, -9.0, 9.0, -16.0, 16.0),
    );

    let mut timer = Timer::new();
    let mut commands = RenderCommandBuffer::new();
    for frame in 0..240u32 {
        timer.update();
        let elapsed = frame as f32 / 60.0;

        // Advance the orbits; descendants re-derive during update.
        scene.set_node_transform(&inner_orbit, orbit_transform(6.0, elapsed * TAU / 8.0))?;
        scene.set_node_transform(&outer_orbit, orbit_transform(11.0, elapsed * TAU / 20.0))?;
        scene.set_node_transform(&moon_orbit, orbit_transform(2.0, elapsed * TAU / 2.0))?;

        visibility.set_frustum(view.frustum().clone());
        scene.update(1.0 / 60.0);

        commands.clear();
        scene.commit(&view, &mut commands);

        if frame % 60 == 0 {
            log::info!(
                "Frame {frame}: {} visible, {} commands",
                visibility.visible().len(),
                commands.len()
            );
        }
    }

    log::info!(
        "Done after {} frames ({:.1} fps average)",
        timer.frame_count(),
        timer.average_fps()
    );
    Ok(())
}
