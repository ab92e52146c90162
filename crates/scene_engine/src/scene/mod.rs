//! The scene graph runtime.
//!
//! Definitions ([`SceneNode`]) are reference counted and may be shared across
//! parents; attaching one realizes per-placement instantiations
//! ([`TreeNode`]) that carry world transforms and per-item-list correlation
//! state. Item lists ([`ItemList`]) subscribe to the subset of
//! instantiations they care about and are driven through the scene's
//! per-frame update/commit protocol ([`Scene`]).

mod commands;
mod entry_store;
mod error;
mod item_list;
mod node;
mod registry;
#[allow(clippy::module_inception)]
mod scene;
mod tree;
mod view;

pub use commands::{DrawCommand, RenderCommand, RenderCommandBuffer};
pub use entry_store::EntryStore;
pub use error::SceneError;
pub use item_list::{AddNodeContext, EntryId, ItemData, ItemList, NodeItemData};
pub use node::{NodeRef, NodeType, SceneNode, TransformNode, TRANSFORM_NODE_TYPE};
pub use registry::{ResourceHandle, ResourceRegistry, ResourceType};
pub use scene::{Scene, SceneBuilder};
pub use tree::{TreeNode, TreeNodeKey};
pub use view::View;
