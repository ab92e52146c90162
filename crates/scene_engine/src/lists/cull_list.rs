//! Visibility culling as a shared-tier item list.
//!
//! A [`CullList`] tracks every instantiation of a [`CullNode`] and keeps its
//! world-space bounds current as transforms propagate. Each frame its
//! `update` intersects those bounds against the frustum published on the
//! shared [`VisibilitySet`]; lists later in the frame (and the application)
//! read the surviving set from the same handle.

use std::sync::{Arc, RwLock};

use crate::foundation::bounds::{Aabb, Frustum};
use crate::foundation::math::Mat4;
use crate::scene::{
    AddNodeContext, EntryId, EntryStore, ItemData, ItemList, NodeRef, NodeType, SceneNode,
    TreeNodeKey,
};

/// Type tag for cullable nodes.
pub static CULL_NODE_TYPE: NodeType = NodeType::new("cull");

/// Payload for nodes with local-space bounds that can be culled.
pub struct CullNode {
    bounds: Aabb,
}

impl CullNode {
    /// Create a cullable node definition.
    ///
    /// `item_lists` names the lists the node registers with; include the
    /// cull list's name for the node to participate in visibility.
    pub fn new(bounds: Aabb, item_lists: &[&str]) -> NodeRef {
        SceneNode::new(&CULL_NODE_TYPE, item_lists, Self { bounds })
    }

    /// The node's local-space bounds.
    pub fn local_bounds(&self) -> Aabb {
        self.bounds
    }
}

#[derive(Default)]
struct VisibilityState {
    frustum: Option<Frustum>,
    visible: Vec<(EntryId, TreeNodeKey)>,
}

/// Shared handle to a cull list's per-frame results.
///
/// The application publishes the frustum before the scene update; after the
/// shared tier ran, the surviving instantiations are readable here.
#[derive(Clone, Default)]
pub struct VisibilitySet {
    state: Arc<RwLock<VisibilityState>>,
}

impl VisibilitySet {
    /// Publish the frustum to cull against this frame. Without one, every
    /// tracked node is considered visible.
    pub fn set_frustum(&self, frustum: Frustum) {
        self.state.write().unwrap().frustum = Some(frustum);
    }

    /// The instantiations that survived the last cull.
    pub fn visible(&self) -> Vec<(EntryId, TreeNodeKey)> {
        self.state.read().unwrap().visible.clone()
    }

    /// True if the given instantiation survived the last cull.
    pub fn is_visible(&self, key: TreeNodeKey) -> bool {
        self.state
            .read()
            .unwrap()
            .visible
            .iter()
            .any(|(_, visible_key)| *visible_key == key)
    }
}

struct CullEntry {
    key: TreeNodeKey,
    local: Aabb,
    world: Aabb,
}

/// Shared-tier item list computing the visible set of cullable nodes.
pub struct CullList {
    name: String,
    entries: EntryStore<CullEntry>,
    results: VisibilitySet,
}

impl CullList {
    /// Create a cull list and the handle its results are shared through.
    pub fn new(name: &str) -> (Self, VisibilitySet) {
        let results = VisibilitySet::default();
        (
            Self {
                name: name.to_string(),
                entries: EntryStore::new(),
                results: results.clone(),
            },
            results,
        )
    }

    /// Number of tracked instantiations.
    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }
}

impl ItemList for CullList {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_node(&mut self, ctx: AddNodeContext<'_>) -> Option<(EntryId, Option<ItemData>)> {
        let cull_node = ctx.node.payload::<CullNode>()?;
        let local = cull_node.local_bounds();
        let entry = self.entries.insert(CullEntry {
            key: ctx.key,
            local,
            world: local.transformed(ctx.world),
        });
        Some((entry, None))
    }

    fn update_node(&mut self, entry: EntryId, _key: TreeNodeKey, world: &Mat4) {
        if let Some(cull_entry) = self.entries.get_mut(entry) {
            cull_entry.world = cull_entry.local.transformed(world);
        }
    }

    fn remove_node(&mut self, entry: EntryId) {
        self.entries.defer_remove(entry);
    }

    fn pre_transform_update(&mut self, _delta_time: f32) {
        self.entries.flush_removals();
    }

    fn update(&mut self, _delta_time: f32) {
        let mut guard = self.results.state.write().unwrap();
        let state = &mut *guard;
        state.visible.clear();
        match &state.frustum {
            Some(frustum) => {
                for (entry, cull_entry) in self.entries.iter() {
                    if frustum.intersects_aabb(&cull_entry.world) {
                        state.visible.push((entry, cull_entry.key));
                    }
                }
            }
            None => {
                for (entry, cull_entry) in self.entries.iter() {
                    state.visible.push((entry, cull_entry.key));
                }
            }
        }
        log::trace!(
            "Cull list '{}': {} of {} visible",
            self.name,
            state.visible.len(),
            self.entries.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::{Scene, TransformNode};

    fn ortho_frustum() -> Frustum {
        // Covers [-1, 1] on every axis.
        Frustum::from_matrix(&Mat4::new_orthographic(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0))
    }

    fn unit_bounds() -> Aabb {
        Aabb::from_center_extents(Vec3::zeros(), Vec3::new(0.1, 0.1, 0.1))
    }

    #[test]
    fn test_cull_list_tracks_and_culls() {
        let (cull_list, visibility) = CullList::new("culling");
        let mut scene = Scene::builder()
            .shared_tier(vec![Box::new(cull_list)])
            .build()
            .unwrap();

        let inside = CullNode::new(unit_bounds(), &["culling"]);
        let transform = TransformNode::new(Mat4::new_translation(&Vec3::new(50.0, 0.0, 0.0)));
        let outside = CullNode::new(unit_bounds(), &["culling"]);

        scene.add_root(&inside).unwrap();
        scene.add_root(&transform).unwrap();
        scene.add_child(&transform, &outside).unwrap();

        visibility.set_frustum(ortho_frustum());
        scene.update(0.016);

        let visible = visibility.visible();
        assert_eq!(visible.len(), 1);
        let inside_key = scene.find_unique_tree_node(None, &inside).unwrap();
        assert!(visibility.is_visible(inside_key));
    }

    #[test]
    fn test_cull_list_follows_transform_changes() {
        let (cull_list, visibility) = CullList::new("culling");
        let mut scene = Scene::builder()
            .shared_tier(vec![Box::new(cull_list)])
            .build()
            .unwrap();

        let transform = TransformNode::new(Mat4::identity());
        let node = CullNode::new(unit_bounds(), &["culling"]);
        scene.add_root(&transform).unwrap();
        scene.add_child(&transform, &node).unwrap();

        visibility.set_frustum(ortho_frustum());
        scene.update(0.016);
        assert_eq!(visibility.visible().len(), 1);

        // Move the subtree out of the frustum; the cull list learns of the
        // new world bounds through the transform pass.
        scene
            .set_node_transform(&transform, Mat4::new_translation(&Vec3::new(100.0, 0.0, 0.0)))
            .unwrap();
        scene.update(0.016);
        assert!(visibility.visible().is_empty());
    }

    #[test]
    fn test_cull_list_without_frustum_keeps_everything() {
        let (cull_list, visibility) = CullList::new("culling");
        let mut scene = Scene::builder()
            .shared_tier(vec![Box::new(cull_list)])
            .build()
            .unwrap();

        let node = CullNode::new(unit_bounds(), &["culling"]);
        scene.add_root(&node).unwrap();
        scene.update(0.016);

        assert_eq!(visibility.visible().len(), 1);
    }
}
