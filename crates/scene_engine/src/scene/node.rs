//! Scene node definitions: the reference-counted building blocks of the
//! scene graph.
//!
//! A [`SceneNode`] is a *definition*: it describes what exists (type, item
//! list memberships, payload, children) but not where. Attaching a node under
//! a parent instantiates one tree node per instantiation of that parent, so a
//! single definition shared by several parents is realized several times,
//! each with its own world transform (see [`crate::scene::tree`]).
//!
//! Nodes are reference counted through [`NodeRef`] (`Arc`): cloning a ref is
//! the add-ref, dropping it the free-ref, and the payload's `Drop` runs
//! exactly once when the last reference goes away. Children hold their own
//! references; destroying a parent never recursively destroys shared
//! children.
//!
//! A node may appear any number of times in a scene, but not twice under the
//! same direct parent. Deeper cycles (a node reachable from itself) are not
//! detected and must be avoided by the caller.

use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use crate::foundation::math::Mat4;

/// Identity tag for a concrete node type.
///
/// Declare one static per concrete type, optionally chained to a parent type
/// to model an "is-a" hierarchy:
///
/// ```
/// use scene_engine::scene::NodeType;
///
/// static SPRITE_TYPE: NodeType = NodeType::new("sprite");
/// static ANIMATED_SPRITE_TYPE: NodeType = NodeType::derived("animated_sprite", &SPRITE_TYPE);
///
/// assert!(ANIMATED_SPRITE_TYPE.is_subtype_of(&SPRITE_TYPE));
/// assert!(!SPRITE_TYPE.is_subtype_of(&ANIMATED_SPRITE_TYPE));
/// ```
#[derive(Debug)]
pub struct NodeType {
    name: &'static str,
    parent: Option<&'static NodeType>,
}

impl NodeType {
    /// Create a root node type with no parent.
    pub const fn new(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Create a node type derived from a parent type.
    pub const fn derived(name: &'static str, parent: &'static NodeType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// The diagnostic name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Walk the ancestor chain, returning true if `other` is this type or
    /// any of its ancestors. Types compare by identity, not name.
    pub fn is_subtype_of(&'static self, other: &'static NodeType) -> bool {
        let mut current = Some(self);
        while let Some(node_type) = current {
            if std::ptr::eq(node_type, other) {
                return true;
            }
            current = node_type.parent;
        }
        false
    }
}

/// Type tag for [`TransformNode`] payloads.
pub static TRANSFORM_NODE_TYPE: NodeType = NodeType::new("transform");

/// Type tag for the hidden root node owned by each scene.
pub(crate) static ROOT_NODE_TYPE: NodeType = NodeType::new("root");

/// Shared handle to a scene node.
///
/// Cloning increments the reference count; dropping the last handle destroys
/// the node and runs its payload's `Drop`.
pub type NodeRef = Arc<SceneNode>;

/// A reference-counted element of the scene graph.
///
/// The set of item list names is fixed at construction; membership is decided
/// per instantiation by the named lists themselves when the node is attached.
pub struct SceneNode {
    node_type: &'static NodeType,
    item_lists: Arc<[String]>,
    children: RwLock<Vec<NodeRef>>,
    tree_node_count: AtomicU32,
    payload: Box<dyn Any + Send + Sync>,
}

impl SceneNode {
    /// Create a node with a type tag, the names of the item lists it wants to
    /// register with, and a subtype payload.
    ///
    /// The payload is destroyed (its `Drop` runs) exactly once, when the last
    /// [`NodeRef`] is dropped.
    pub fn new(
        node_type: &'static NodeType,
        item_lists: &[&str],
        payload: impl Any + Send + Sync,
    ) -> NodeRef {
        let item_lists: Arc<[String]> =
            item_lists.iter().map(|name| (*name).to_string()).collect();
        log::trace!(
            "Creating node of type '{}' with {} item list(s)",
            node_type.name,
            item_lists.len()
        );
        Arc::new(Self {
            node_type,
            item_lists,
            children: RwLock::new(Vec::new()),
            tree_node_count: AtomicU32::new(0),
            payload: Box::new(payload),
        })
    }

    /// The node's concrete type tag.
    pub fn node_type(&self) -> &'static NodeType {
        self.node_type
    }

    /// True if the node's type is `node_type` or derives from it.
    pub fn is_of_type(&self, node_type: &'static NodeType) -> bool {
        self.node_type.is_subtype_of(node_type)
    }

    /// The item list names the node registers with, fixed at construction.
    pub fn item_lists(&self) -> &[String] {
        &self.item_lists
    }

    pub(crate) fn item_lists_shared(&self) -> Arc<[String]> {
        self.item_lists.clone()
    }

    /// Downcast the subtype payload.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.read().unwrap().len()
    }

    /// Get a direct child by index.
    pub fn child(&self, index: usize) -> Option<NodeRef> {
        self.children.read().unwrap().get(index).cloned()
    }

    /// True if `child` is already a direct child of this node.
    pub fn has_direct_child(&self, child: &NodeRef) -> bool {
        self.children
            .read()
            .unwrap()
            .iter()
            .any(|existing| Arc::ptr_eq(existing, child))
    }

    /// Number of tree node instantiations currently realized for this node.
    pub fn tree_node_count(&self) -> u32 {
        self.tree_node_count.load(Ordering::Acquire)
    }

    pub(crate) fn children_snapshot(&self) -> Vec<NodeRef> {
        self.children.read().unwrap().clone()
    }

    pub(crate) fn push_child(&self, child: NodeRef) {
        self.children.write().unwrap().push(child);
    }

    /// Remove the definition-level child entry, returning the removed ref.
    pub(crate) fn take_child(&self, child: &NodeRef) -> Option<NodeRef> {
        let mut children = self.children.write().unwrap();
        let index = children
            .iter()
            .position(|existing| Arc::ptr_eq(existing, child))?;
        Some(children.remove(index))
    }

    pub(crate) fn increment_tree_nodes(&self) {
        self.tree_node_count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn decrement_tree_nodes(&self) {
        self.tree_node_count.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("type", &self.node_type.name)
            .field("item_lists", &self.item_lists)
            .field("children", &self.child_count())
            .field("tree_nodes", &self.tree_node_count())
            .finish()
    }
}

/// Payload for nodes that position their subtree.
///
/// The local transform is relative to the nearest transform ancestor. Do not
/// mutate it directly from outside: [`crate::scene::Scene::set_node_transform`]
/// writes the new value and marks every instantiation dirty so descendants
/// are re-derived on the next update.
pub struct TransformNode {
    local: RwLock<Mat4>,
}

impl TransformNode {
    /// Create a transform node definition with the given local transform.
    ///
    /// Transform nodes don't register with item lists themselves; they exist
    /// to position the subtree below them.
    pub fn new(local: Mat4) -> NodeRef {
        SceneNode::new(&TRANSFORM_NODE_TYPE, &[], Self {
            local: RwLock::new(local),
        })
    }

    /// The node's local transform.
    pub fn local(&self) -> Mat4 {
        *self.local.read().unwrap()
    }

    pub(crate) fn set_local(&self, local: Mat4) {
        *self.local.write().unwrap() = local;
    }
}
