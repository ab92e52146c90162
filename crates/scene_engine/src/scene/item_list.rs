//! The item list contract: pluggable per-frame subscribers over the scene
//! tree.
//!
//! An item list is a named consumer (renderer, light preparer, physics
//! stepper, particle driver) that tracks the subset of tree nodes it cares
//! about. When a node naming the list is instantiated, the scene calls
//! [`ItemList::add_node`]; the list decides relevance and, if it tracks the
//! node, allocates an opaque [`EntryId`] of its own. That handle is the only
//! correlation the scene stores: it is passed back verbatim on every
//! subsequent update/reparent/remove notification for that instantiation and
//! stays stable until removal.
//!
//! All capabilities default to no-ops so a list implements only what it
//! needs. Lists must not poll the tree for transforms; `update_node` is the
//! only path by which transform changes are delivered.

use std::any::Any;
use std::sync::Arc;

use crate::foundation::math::Mat4;
use crate::scene::commands::RenderCommandBuffer;
use crate::scene::node::NodeRef;
use crate::scene::tree::TreeNodeKey;
use crate::scene::view::View;

/// Opaque correlation handle an item list allocates for one tracked tree
/// node.
///
/// Only meaningful to the list that produced it. Lists should allocate these
/// from a monotonically increasing counter and never reuse values, so a stale
/// handle can't collide with a live entry (see
/// [`EntryStore`](crate::scene::EntryStore)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

/// Data an item list publishes on a tree node for sibling lists to read.
pub type ItemData = Arc<dyn Any + Send + Sync>;

/// Per-instantiation storage for the data item lists publish on a tree node.
///
/// Slots follow the order of the node's item list names. A list can look up
/// what an earlier list on the same node stored, e.g. a physics stepper
/// reading the collider data a setup list attached.
pub struct NodeItemData {
    names: Arc<[String]>,
    data: Vec<Option<ItemData>>,
}

impl NodeItemData {
    pub(crate) fn new(names: Arc<[String]>) -> Self {
        let count = names.len();
        Self {
            names,
            data: vec![None; count],
        }
    }

    /// Look up the data a list stored on this tree node by list name.
    pub fn find(&self, list_name: &str) -> Option<&ItemData> {
        let index = self.names.iter().position(|name| name == list_name)?;
        self.data[index].as_ref()
    }

    /// Number of item list slots on this tree node.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the node registered with no item lists.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn set(&mut self, index: usize, data: Option<ItemData>) {
        self.data[index] = data;
    }
}

/// Everything an item list needs to decide whether to track a new tree node.
pub struct AddNodeContext<'a> {
    /// The definition node being instantiated.
    pub node: &'a NodeRef,

    /// The key of the new tree node in the scene's arena.
    pub key: TreeNodeKey,

    /// The instantiation's world transform at attach time.
    pub world: &'a Mat4,

    /// Data already published on this tree node by lists earlier in the
    /// node's item list order.
    pub sibling_data: &'a NodeItemData,
}

/// A pluggable frame-driven subscriber tracking a subset of tree nodes.
///
/// Every method is optional. Implementations own their entry bookkeeping;
/// [`EntryStore`](crate::scene::EntryStore) provides the common discipline
/// (monotone handles, deferred removal).
pub trait ItemList: Send {
    /// The unique name nodes use to register with this list.
    fn name(&self) -> &str;

    /// Whether commit requires a dedicated command recording context.
    fn needs_command_buffer(&self) -> bool {
        false
    }

    /// Number of shared uniform slots the render pipeline should reserve for
    /// this list.
    fn global_value_count(&self) -> u32 {
        0
    }

    /// Decide whether to track a newly instantiated tree node.
    ///
    /// Return `None` if the node is irrelevant to this list (or an internal
    /// failure prevents tracking it — a soft failure, never an error): the
    /// list will receive no further calls for this instantiation. Otherwise
    /// return the handle for the instantiation and optionally data to publish
    /// for sibling lists on the same node.
    fn add_node(&mut self, ctx: AddNodeContext<'_>) -> Option<(EntryId, Option<ItemData>)> {
        let _ = ctx;
        None
    }

    /// A tracked instantiation's world transform changed.
    ///
    /// Called during the scene's transform pass; this is the only
    /// notification path for transform changes.
    fn update_node(&mut self, entry: EntryId, key: TreeNodeKey, world: &Mat4) {
        let _ = (entry, key, world);
    }

    /// A tracked instantiation moved to a new parent without being
    /// destroyed. The handle stays valid; rebind any parent-relative state.
    fn reparent_node(&mut self, entry: EntryId, prev_parent: TreeNodeKey, new_parent: TreeNodeKey) {
        let _ = (entry, prev_parent, new_parent);
    }

    /// A tracked instantiation was removed. The handle is dead after this
    /// call; every non-`None` `add_node` is matched by exactly one
    /// `remove_node`.
    ///
    /// May be delivered while the list is mid-iteration elsewhere in the
    /// frame — lists that iterate their entries should defer the compaction
    /// (see [`EntryStore::defer_remove`](crate::scene::EntryStore::defer_remove)).
    fn remove_node(&mut self, entry: EntryId) {
        let _ = entry;
    }

    /// First phase of the frame, before the transform pass. Deferred-removal
    /// queues are flushed here.
    fn pre_transform_update(&mut self, delta_time: f32) {
        let _ = delta_time;
    }

    /// Per-frame update, after the transform pass. Shared-tier lists run
    /// tier by tier before the main pipeline's lists.
    fn update(&mut self, delta_time: f32) {
        let _ = delta_time;
    }

    /// Called during commit before this list's render pass begins.
    fn pre_render_pass(&mut self, view: &View) {
        let _ = view;
    }

    /// Emit backend commands for this frame using state prepared in
    /// `update`.
    fn commit(&mut self, view: &View, commands: &mut RenderCommandBuffer) {
        let _ = (view, commands);
    }
}
