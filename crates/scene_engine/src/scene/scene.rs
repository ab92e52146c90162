//! Scene orchestration: root management, graph mutation, and the per-frame
//! update/commit protocol.
//!
//! A scene owns the realized tree node forest and an ordered set of item
//! lists, split into shared tiers (run first each frame, group by group) and
//! the main pipeline (render passes and compute items, run in array order).
//!
//! Graph mutation (attach, detach, reparent) goes through the scene because
//! the instance arena lives here; definitions only count their
//! instantiations. Mutation is not safe against a concurrently running
//! `update`/`commit` pass and must be driven from the same thread as the
//! frame loop.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::SceneConfig;
use crate::foundation::math::Mat4;
use crate::scene::commands::RenderCommandBuffer;
use crate::scene::error::SceneError;
use crate::scene::item_list::ItemList;
use crate::scene::node::{NodeRef, SceneNode, TransformNode, ROOT_NODE_TYPE};
use crate::scene::tree::{Forest, TreeNode, TreeNodeKey};
use crate::scene::view::View;

/// One element of the main rendering pipeline.
enum PipelineItem {
    /// A render pass: its lists commit between begin/end markers.
    RenderPass { name: String, lists: Vec<usize> },
    /// A compute item: commits without render pass markers.
    Compute { list: usize },
}

enum PipelineItemDesc {
    RenderPass {
        name: String,
        lists: Vec<Box<dyn ItemList>>,
    },
    Compute {
        list: Box<dyn ItemList>,
    },
}

/// Builder assembling a scene's item list layout.
///
/// Shared tiers run before the pipeline each frame; each tier is a barrier —
/// its lists all complete before the next tier starts. The pipeline mixes
/// render passes (whose lists commit inside pass markers) and compute items.
#[derive(Default)]
pub struct SceneBuilder {
    config: SceneConfig,
    shared_tiers: Vec<Vec<Box<dyn ItemList>>>,
    pipeline: Vec<PipelineItemDesc>,
}

impl SceneBuilder {
    /// Start building a scene with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given configuration.
    pub fn with_config(mut self, config: SceneConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a shared tier. Lists within one tier own disjoint state and may
    /// be dispatched concurrently by the caller; tiers are barriers.
    pub fn shared_tier(mut self, lists: Vec<Box<dyn ItemList>>) -> Self {
        self.shared_tiers.push(lists);
        self
    }

    /// Append a render pass to the pipeline.
    pub fn render_pass(mut self, name: &str, lists: Vec<Box<dyn ItemList>>) -> Self {
        self.pipeline.push(PipelineItemDesc::RenderPass {
            name: name.to_string(),
            lists,
        });
        self
    }

    /// Append a compute item to the pipeline.
    pub fn compute(mut self, list: Box<dyn ItemList>) -> Self {
        self.pipeline.push(PipelineItemDesc::Compute { list });
        self
    }

    /// Build the scene. Fails with [`SceneError::InvalidArgument`] if two
    /// item lists share a name.
    pub fn build(self) -> Result<Scene, SceneError> {
        fn register(
            lists: &mut Vec<Box<dyn ItemList>>,
            names: &mut HashMap<String, usize>,
            list: Box<dyn ItemList>,
        ) -> Result<usize, SceneError> {
            let name = list.name().to_string();
            if names.contains_key(&name) {
                return Err(SceneError::InvalidArgument(format!(
                    "Item list '{name}' isn't unique within the scene"
                )));
            }
            let index = lists.len();
            names.insert(name, index);
            lists.push(list);
            Ok(index)
        }

        let mut lists = Vec::new();
        let mut names = HashMap::new();

        let mut shared_tiers = Vec::with_capacity(self.shared_tiers.len());
        for tier in self.shared_tiers {
            let mut indices = Vec::with_capacity(tier.len());
            for list in tier {
                indices.push(register(&mut lists, &mut names, list)?);
            }
            shared_tiers.push(indices);
        }

        let mut pipeline = Vec::with_capacity(self.pipeline.len());
        for item in self.pipeline {
            match item {
                PipelineItemDesc::RenderPass {
                    name,
                    lists: pass_lists,
                } => {
                    let mut indices = Vec::with_capacity(pass_lists.len());
                    for list in pass_lists {
                        indices.push(register(&mut lists, &mut names, list)?);
                    }
                    pipeline.push(PipelineItem::RenderPass {
                        name,
                        lists: indices,
                    });
                }
                PipelineItemDesc::Compute { list } => {
                    pipeline.push(PipelineItem::Compute {
                        list: register(&mut lists, &mut names, list)?,
                    });
                }
            }
        }

        let global_value_count = lists.iter().map(|list| list.global_value_count()).sum();

        let root_node = SceneNode::new(&ROOT_NODE_TYPE, &[], ());
        let mut forest = Forest::with_capacity(
            self.config.expected_node_count,
            self.config.dirty_capacity,
        );
        let root_key = forest.insert_root(&root_node);

        log::info!(
            "Created scene with {} item list(s) across {} shared tier(s) and {} pipeline item(s)",
            lists.len(),
            shared_tiers.len(),
            pipeline.len()
        );

        Ok(Scene {
            lists,
            names,
            shared_tiers,
            pipeline,
            forest,
            root_node,
            root_key,
            global_value_count,
        })
    }
}

/// A realized scene graph plus the item lists consuming it.
pub struct Scene {
    lists: Vec<Box<dyn ItemList>>,
    names: HashMap<String, usize>,
    shared_tiers: Vec<Vec<usize>>,
    pipeline: Vec<PipelineItem>,
    forest: Forest,
    root_node: NodeRef,
    root_key: TreeNodeKey,
    global_value_count: u32,
}

impl Scene {
    /// Start building a scene.
    pub fn builder() -> SceneBuilder {
        SceneBuilder::new()
    }

    /// Number of shared uniform slots the render pipeline should reserve for
    /// all lists combined.
    pub fn global_value_count(&self) -> u32 {
        self.global_value_count
    }

    /// Number of root nodes attached to the scene.
    pub fn root_count(&self) -> usize {
        self.root_node.child_count()
    }

    /// Get a root node by index.
    pub fn root(&self, index: usize) -> Option<NodeRef> {
        self.root_node.child(index)
    }

    /// Number of realized tree node instantiations, excluding the hidden
    /// scene root.
    pub fn tree_node_count(&self) -> usize {
        self.forest.len() - 1
    }

    /// Access one instantiation.
    pub fn tree_node(&self, key: TreeNodeKey) -> Option<&TreeNode> {
        self.forest.get(key)
    }

    /// Attach a node as a root of the scene.
    ///
    /// A node may be a root of at most one scene at a time.
    pub fn add_root(&mut self, node: &NodeRef) -> Result<(), SceneError> {
        let root = self.root_node.clone();
        self.add_child(&root, node)
    }

    /// Detach a root node, recursively removing every tree node below it and
    /// notifying every subscribed item list.
    pub fn remove_root(&mut self, node: &NodeRef) -> Result<(), SceneError> {
        let root = self.root_node.clone();
        self.remove_child(&root, node)
    }

    /// Detach a root node by index.
    pub fn remove_root_index(&mut self, index: usize) -> Result<(), SceneError> {
        let root = self.root_node.clone();
        self.remove_child_index(&root, index)
    }

    /// Detach every root node.
    pub fn clear_roots(&mut self) {
        let root = self.root_node.clone();
        while let Some(child) = root.child(0) {
            // Direct children always resolve; ignore the can't-happen miss.
            let _ = self.remove_child(&root, &child);
        }
    }

    /// Attach `child` under `parent`.
    ///
    /// Creates one new instantiation of `child`'s subtree per existing
    /// instantiation of `parent` and queries every item list named by the
    /// subtree's nodes for membership. A list declining a node (or failing
    /// internally) is a soft failure: the node is simply untracked by that
    /// list, and the attach succeeds.
    ///
    /// Fails with [`SceneError::InvalidArgument`] if `child` is already a
    /// direct child of `parent` (the graph is left unchanged). Cycles deeper
    /// than the direct-child level are not detected; attaching a node as its
    /// own descendant is undefined.
    pub fn add_child(&mut self, parent: &NodeRef, child: &NodeRef) -> Result<(), SceneError> {
        if Arc::ptr_eq(parent, child) {
            return Err(SceneError::InvalidArgument(
                "A node can't be attached to itself".to_string(),
            ));
        }
        if parent.has_direct_child(child) {
            return Err(SceneError::InvalidArgument(
                "Node is already a direct child of the parent".to_string(),
            ));
        }

        parent.push_child(child.clone());
        for parent_key in self.forest.instance_keys(parent) {
            self.forest
                .instantiate_subtree(&mut self.lists, &self.names, parent_key, child);
        }
        Ok(())
    }

    /// Detach `child` from `parent`.
    ///
    /// For every instantiation of `child` under `parent`, each item list
    /// tracking a node of the removed subtree receives exactly one
    /// `remove_node` with the handle it allocated, then the tree nodes are
    /// released. Fails with [`SceneError::NotFound`] if `child` isn't a
    /// direct child of `parent`.
    pub fn remove_child(&mut self, parent: &NodeRef, child: &NodeRef) -> Result<(), SceneError> {
        let removed = parent.take_child(child).ok_or_else(|| {
            SceneError::NotFound("Node is not a direct child of the parent".to_string())
        })?;
        self.forest
            .remove_child_instances(&mut self.lists, parent, child);
        drop(removed);
        Ok(())
    }

    /// Detach the `index`-th child of `parent`.
    pub fn remove_child_index(
        &mut self,
        parent: &NodeRef,
        index: usize,
    ) -> Result<(), SceneError> {
        let child = parent.child(index).ok_or_else(|| {
            SceneError::InvalidArgument(format!("Child index {index} out of range"))
        })?;
        self.remove_child(parent, &child)
    }

    /// Move `child` from `old_parent` to `new_parent` without destroying and
    /// recreating its instantiations.
    ///
    /// Requires both parents to have the same instantiation count so the
    /// moved instances pair one-to-one; fails with
    /// [`SceneError::InvalidArgument`] otherwise, leaving the graph
    /// unchanged. Instances pair by instantiation order — equal counts that
    /// arise by coincidence rather than shared ancestry are not supported.
    ///
    /// Tracking item lists keep their handles and receive a single
    /// `reparent_node` notification per moved instantiation; no add/remove
    /// pair is observed. Moved subtrees are marked dirty so their transforms
    /// re-derive on the next update.
    pub fn reparent_child(
        &mut self,
        old_parent: &NodeRef,
        new_parent: &NodeRef,
        child: &NodeRef,
    ) -> Result<(), SceneError> {
        if !old_parent.has_direct_child(child) {
            return Err(SceneError::NotFound(
                "Node is not a direct child of the old parent".to_string(),
            ));
        }
        if new_parent.has_direct_child(child) {
            return Err(SceneError::InvalidArgument(
                "Node is already a direct child of the new parent".to_string(),
            ));
        }
        if old_parent.tree_node_count() != new_parent.tree_node_count() {
            return Err(SceneError::InvalidArgument(format!(
                "Mismatched instantiation counts on reparent ({} vs {})",
                old_parent.tree_node_count(),
                new_parent.tree_node_count()
            )));
        }

        if let Some(taken) = old_parent.take_child(child) {
            new_parent.push_child(taken);
        }
        self.forest
            .reparent_child_instances(&mut self.lists, old_parent, new_parent, child);
        Ok(())
    }

    /// Set a transform node's local transform, marking every instantiation
    /// dirty so the subtree re-derives on the next update.
    ///
    /// Fails with [`SceneError::InvalidArgument`] if the node doesn't carry a
    /// [`TransformNode`] payload.
    pub fn set_node_transform(&mut self, node: &NodeRef, local: Mat4) -> Result<(), SceneError> {
        let transform = node.payload::<TransformNode>().ok_or_else(|| {
            SceneError::InvalidArgument("Node is not a transform node".to_string())
        })?;
        transform.set_local(local);
        self.mark_node_dirty(node);
        Ok(())
    }

    /// Flag every instantiation of a node for transform re-derivation.
    pub fn mark_node_dirty(&mut self, node: &NodeRef) {
        for key in self.forest.instance_keys(node) {
            self.forest.mark_dirty(key);
        }
    }

    /// Find the single instantiation of `descendant` reachable from `base`
    /// (or from the scene root when `base` is `None`).
    ///
    /// `base` must have exactly one instantiation. Returns `None` when it
    /// doesn't, when `descendant` is unreachable, or when more than one
    /// instantiation of `descendant` is reachable.
    pub fn find_unique_tree_node(
        &self,
        base: Option<&NodeRef>,
        descendant: &NodeRef,
    ) -> Option<TreeNodeKey> {
        self.forest
            .find_unique_tree_node(base, self.root_key, descendant)
    }

    /// Find an item list by name.
    pub fn find_item_list(&self, name: &str) -> Option<&dyn ItemList> {
        self.names.get(name).map(|&index| &*self.lists[index])
    }

    /// Visit every item list in registration order. The visitor returns
    /// false to stop early.
    pub fn for_each_item_list(&self, mut visit: impl FnMut(&dyn ItemList) -> bool) {
        for list in &self.lists {
            if !visit(&**list) {
                break;
            }
        }
    }

    /// Run one frame of updates.
    ///
    /// Phases, in order: every list's `pre_transform_update` (deferred
    /// removal queues flush here), the transform pass (delivering
    /// `update_node` for every re-derived instantiation), shared tiers tier
    /// by tier, then the pipeline lists' `update` in array order.
    ///
    /// A started pass runs every phase to completion; graph mutation while a
    /// pass is running is a contract violation.
    pub fn update(&mut self, delta_time: f32) {
        for list in &mut self.lists {
            list.pre_transform_update(delta_time);
        }

        self.forest.flush_dirty(&mut self.lists);

        for tier in &self.shared_tiers {
            for &index in tier {
                self.lists[index].update(delta_time);
            }
        }

        for item in &self.pipeline {
            match item {
                PipelineItem::RenderPass { lists, .. } => {
                    for &index in lists {
                        self.lists[index].update(delta_time);
                    }
                }
                PipelineItem::Compute { list } => self.lists[*list].update(delta_time),
            }
        }
    }

    /// Commit the frame: walk the pipeline in array order, calling each
    /// item's `pre_render_pass` then `commit`, bracketing render pass lists
    /// with begin/end markers in the command stream.
    pub fn commit(&mut self, view: &View, commands: &mut RenderCommandBuffer) {
        for item in &self.pipeline {
            match item {
                PipelineItem::RenderPass { name, lists } => {
                    for &index in lists {
                        self.lists[index].pre_render_pass(view);
                    }
                    commands.begin_render_pass(name);
                    for &index in lists {
                        self.lists[index].commit(view, commands);
                    }
                    commands.end_render_pass(name);
                }
                PipelineItem::Compute { list } => {
                    self.lists[*list].pre_render_pass(view);
                    self.lists[*list].commit(view, commands);
                }
            }
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.clear_roots();
    }
}
