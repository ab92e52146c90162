//! Tree node instantiation and transform propagation.
//!
//! The scene tree reflects the realized scene graph: one [`TreeNode`] exists
//! per (definition node, attachment path) pair. Attaching a definition under
//! a parent that is realized N times creates N independent instantiations of
//! the whole attached subtree, each carrying its own world transform and its
//! own per-item-list correlation slots.
//!
//! Instances live in a slotmap arena owned by the scene; definitions hold
//! only an instantiation count, never pointers back to their instances. The
//! scene-side index from definition to instance keys is what mutation
//! operations use to locate the affected instantiations.

use std::collections::HashMap;
use std::sync::Arc;

use slotmap::SlotMap;

use crate::scene::item_list::{AddNodeContext, EntryId, ItemList, NodeItemData};
use crate::scene::node::{NodeRef, TransformNode};
use crate::foundation::math::Mat4;

slotmap::new_key_type! {
    /// Stable key of one tree node within a scene's arena.
    pub struct TreeNodeKey;
}

/// Identity of a definition node, used to index its instantiations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

pub(crate) fn node_id(node: &NodeRef) -> NodeId {
    NodeId(Arc::as_ptr(node) as usize)
}

/// One item list's correlation slot on a tree node: which list tracks the
/// instantiation and under which handle.
#[derive(Debug, Clone, Copy)]
struct ItemBinding {
    list: usize,
    entry: EntryId,
}

/// One instantiation of a definition node at a specific attachment path.
pub struct TreeNode {
    node: NodeRef,
    parent: Option<TreeNodeKey>,
    children: Vec<TreeNodeKey>,
    world: Mat4,
    dirty: bool,
    bindings: Box<[Option<ItemBinding>]>,
    item_data: NodeItemData,
}

impl TreeNode {
    /// The definition node this instantiation realizes.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// The parent tree node, `None` for the scene root.
    pub fn parent(&self) -> Option<TreeNodeKey> {
        self.parent
    }

    /// Keys of this instantiation's children.
    pub fn children(&self) -> &[TreeNodeKey] {
        &self.children
    }

    /// The accumulated world transform.
    pub fn world_transform(&self) -> &Mat4 {
        &self.world
    }

    /// Whether the transform must be re-derived on the next update.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Data published on this instantiation by its item lists.
    pub fn item_data(&self) -> &NodeItemData {
        &self.item_data
    }

    /// The handle the named item list allocated for this instantiation, if
    /// the list tracks it.
    pub fn entry_for(&self, list_name: &str) -> Option<EntryId> {
        let index = self
            .node
            .item_lists()
            .iter()
            .position(|name| name == list_name)?;
        self.bindings[index].map(|binding| binding.entry)
    }
}

/// World transform derivation: transform nodes compose their local onto the
/// parent's world; every other node inherits the parent's world unchanged.
fn compute_world(node: &NodeRef, parent_world: Option<&Mat4>) -> Mat4 {
    let local = node.payload::<TransformNode>().map(TransformNode::local);
    match (parent_world, local) {
        (Some(parent), Some(local)) => parent * local,
        (Some(parent), None) => *parent,
        (None, Some(local)) => local,
        (None, None) => Mat4::identity(),
    }
}

/// The realized tree node forest of one scene.
pub(crate) struct Forest {
    arena: SlotMap<TreeNodeKey, TreeNode>,
    instances: HashMap<NodeId, Vec<TreeNodeKey>>,
    dirty: Vec<TreeNodeKey>,
}

impl Forest {
    pub(crate) fn with_capacity(node_capacity: usize, dirty_capacity: usize) -> Self {
        Self {
            arena: SlotMap::with_capacity_and_key(node_capacity),
            instances: HashMap::new(),
            dirty: Vec::with_capacity(dirty_capacity),
        }
    }

    pub(crate) fn get(&self, key: TreeNodeKey) -> Option<&TreeNode> {
        self.arena.get(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn instance_keys(&self, node: &NodeRef) -> Vec<TreeNodeKey> {
        self.instances
            .get(&node_id(node))
            .cloned()
            .unwrap_or_default()
    }

    /// Insert the hidden root instantiation. The root has no parent and an
    /// identity transform.
    pub(crate) fn insert_root(&mut self, root: &NodeRef) -> TreeNodeKey {
        let key = self.arena.insert(TreeNode {
            node: root.clone(),
            parent: None,
            children: Vec::new(),
            world: Mat4::identity(),
            dirty: false,
            bindings: Box::default(),
            item_data: NodeItemData::new(root.item_lists_shared()),
        });
        root.increment_tree_nodes();
        self.instances.entry(node_id(root)).or_default().push(key);
        key
    }

    /// Instantiate `child`'s subtree under one parent instantiation,
    /// querying every item list named by the subtree's nodes for membership.
    pub(crate) fn instantiate_subtree(
        &mut self,
        lists: &mut [Box<dyn ItemList>],
        list_names: &HashMap<String, usize>,
        parent_key: TreeNodeKey,
        child: &NodeRef,
    ) -> TreeNodeKey {
        let parent_world = self.arena[parent_key].world;
        let world = compute_world(child, Some(&parent_world));

        let key = self.arena.insert_with_key(|key| {
            let mut item_data = NodeItemData::new(child.item_lists_shared());
            let names = child.item_lists();
            let mut bindings = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                let Some(&list_index) = list_names.get(name) else {
                    log::debug!("Node references item list '{name}' not present in this scene");
                    bindings.push(None);
                    continue;
                };

                let added = lists[list_index].add_node(AddNodeContext {
                    node: child,
                    key,
                    world: &world,
                    sibling_data: &item_data,
                });
                match added {
                    Some((entry, data)) => {
                        item_data.set(index, data);
                        bindings.push(Some(ItemBinding {
                            list: list_index,
                            entry,
                        }));
                    }
                    None => bindings.push(None),
                }
            }

            TreeNode {
                node: child.clone(),
                parent: Some(parent_key),
                children: Vec::new(),
                world,
                dirty: false,
                bindings: bindings.into_boxed_slice(),
                item_data,
            }
        });

        self.arena[parent_key].children.push(key);
        child.increment_tree_nodes();
        self.instances.entry(node_id(child)).or_default().push(key);

        for grandchild in child.children_snapshot() {
            self.instantiate_subtree(lists, list_names, key, &grandchild);
        }
        key
    }

    /// Remove every instantiation of `child` that sits under an
    /// instantiation of `parent`, notifying tracking lists bottom-up.
    pub(crate) fn remove_child_instances(
        &mut self,
        lists: &mut [Box<dyn ItemList>],
        parent: &NodeRef,
        child: &NodeRef,
    ) {
        for key in self.instance_keys(child) {
            let Some(tree_node) = self.arena.get(key) else {
                continue;
            };
            let Some(parent_key) = tree_node.parent else {
                continue;
            };
            if !Arc::ptr_eq(&self.arena[parent_key].node, parent) {
                continue;
            }

            self.arena[parent_key].children.retain(|entry| *entry != key);
            self.release_subtree(lists, key);
        }
    }

    /// Release one instantiation and all of its descendants. Children are
    /// recursed first, so a list sees its deepest entries removed before
    /// their ancestors; every tracked entry receives exactly one
    /// `remove_node`.
    pub(crate) fn release_subtree(&mut self, lists: &mut [Box<dyn ItemList>], key: TreeNodeKey) {
        let children = std::mem::take(&mut self.arena[key].children);
        for child_key in children {
            self.release_subtree(lists, child_key);
        }

        let Some(tree_node) = self.arena.remove(key) else {
            return;
        };
        for binding in tree_node.bindings.iter().flatten() {
            lists[binding.list].remove_node(binding.entry);
        }
        tree_node.node.decrement_tree_nodes();

        let id = node_id(&tree_node.node);
        let now_empty = match self.instances.get_mut(&id) {
            Some(keys) => {
                keys.retain(|entry| *entry != key);
                keys.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.instances.remove(&id);
        }
        self.dirty.retain(|entry| *entry != key);
    }

    /// Move `child`'s instantiations from under `old_parent`'s
    /// instantiations to the corresponding instantiations of `new_parent`,
    /// pairing by instantiation order. Tree nodes are preserved; tracking
    /// lists get a single `reparent_node` per moved instantiation and the
    /// moved subtrees are marked dirty.
    pub(crate) fn reparent_child_instances(
        &mut self,
        lists: &mut [Box<dyn ItemList>],
        old_parent: &NodeRef,
        new_parent: &NodeRef,
        child: &NodeRef,
    ) {
        let old_keys = self.instance_keys(old_parent);
        let new_keys = self.instance_keys(new_parent);

        for (&old_key, &new_key) in old_keys.iter().zip(new_keys.iter()) {
            let child_key = self.arena[old_key]
                .children
                .iter()
                .copied()
                .find(|entry| Arc::ptr_eq(&self.arena[*entry].node, child));
            let Some(child_key) = child_key else {
                continue;
            };

            self.arena[old_key].children.retain(|entry| *entry != child_key);
            self.arena[new_key].children.push(child_key);
            self.arena[child_key].parent = Some(new_key);

            let bindings: Vec<ItemBinding> = self.arena[child_key]
                .bindings
                .iter()
                .flatten()
                .copied()
                .collect();
            for binding in bindings {
                lists[binding.list].reparent_node(binding.entry, old_key, new_key);
            }
            self.mark_dirty(child_key);
        }
    }

    /// Flag one instantiation for transform re-derivation.
    pub(crate) fn mark_dirty(&mut self, key: TreeNodeKey) {
        if let Some(tree_node) = self.arena.get_mut(key) {
            if !tree_node.dirty {
                tree_node.dirty = true;
                self.dirty.push(key);
            }
        }
    }

    /// The transform pass: for each flagged instantiation, climb to the
    /// topmost dirty ancestor and re-derive its whole subtree top-down,
    /// clearing dirty flags and notifying every tracking list through
    /// `update_node`.
    ///
    /// A dirty ancestor forces re-derivation of every descendant, including
    /// ones not explicitly flagged, since their worlds depend on the
    /// ancestor's.
    pub(crate) fn flush_dirty(&mut self, lists: &mut [Box<dyn ItemList>]) {
        let flagged = std::mem::take(&mut self.dirty);
        for key in flagged {
            let Some(tree_node) = self.arena.get(key) else {
                continue;
            };
            // Already refreshed through an ancestor flagged earlier.
            if !tree_node.dirty {
                continue;
            }

            let mut top = key;
            while let Some(parent) = self.arena[top].parent {
                if self.arena[parent].dirty {
                    top = parent;
                } else {
                    break;
                }
            }
            self.refresh_subtree(lists, top);
        }
    }

    fn refresh_subtree(&mut self, lists: &mut [Box<dyn ItemList>], key: TreeNodeKey) {
        let parent_world = self.arena[key].parent.map(|parent| self.arena[parent].world);
        let node = self.arena[key].node.clone();
        let world = compute_world(&node, parent_world.as_ref());
        {
            let tree_node = &mut self.arena[key];
            tree_node.world = world;
            tree_node.dirty = false;
        }

        let bindings: Vec<ItemBinding> = self.arena[key]
            .bindings
            .iter()
            .flatten()
            .copied()
            .collect();
        for binding in bindings {
            lists[binding.list].update_node(binding.entry, key, &world);
        }

        let children = self.arena[key].children.clone();
        for child_key in children {
            self.refresh_subtree(lists, child_key);
        }
    }

    /// Find the single instantiation of `descendant` reachable from `base`'s
    /// single instantiation (or from the given root when `base` is `None`).
    ///
    /// Returns `None` when `base` has more than one instantiation, when
    /// `descendant` is unreachable from it, or when more than one
    /// instantiation of `descendant` is reachable (ambiguous — the caller
    /// must disambiguate another way).
    pub(crate) fn find_unique_tree_node(
        &self,
        base: Option<&NodeRef>,
        root_key: TreeNodeKey,
        descendant: &NodeRef,
    ) -> Option<TreeNodeKey> {
        let base_key = match base {
            Some(node) => {
                let keys = self.instances.get(&node_id(node))?;
                if keys.len() != 1 {
                    return None;
                }
                keys[0]
            }
            None => root_key,
        };

        let candidates = self.instances.get(&node_id(descendant))?;
        let mut found = None;
        for &candidate in candidates {
            let mut current = Some(candidate);
            let mut reachable = false;
            while let Some(key) = current {
                if key == base_key {
                    reachable = true;
                    break;
                }
                current = self.arena[key].parent;
            }

            if reachable {
                if found.is_some() {
                    return None;
                }
                found = Some(candidate);
            }
        }
        found
    }
}
