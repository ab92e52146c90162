//! # Scene Engine
//!
//! A scene graph runtime built around three ideas:
//!
//! - **Definitions vs. instances**: reference-counted [`scene::SceneNode`]
//!   definitions may be shared across any number of parents; every
//!   attachment realizes an independent [`scene::TreeNode`] instantiation
//!   with its own world transform.
//! - **Item lists**: pluggable per-frame subscribers ([`scene::ItemList`] —
//!   renderers, light preparers, physics steppers, particle drivers) decide
//!   which instantiations they track and correlate all later notifications
//!   through opaque handles they allocate themselves.
//! - **Phased frames**: [`scene::Scene::update`] flushes deferred removals,
//!   propagates dirty transforms top-down, then runs shared tiers and the
//!   main pipeline in order; [`scene::Scene::commit`] walks the pipeline
//!   emitting backend commands between render pass markers.
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! let (cull_list, visibility) = CullList::new("culling");
//! let mut scene = Scene::builder()
//!     .shared_tier(vec![Box::new(cull_list)])
//!     .build()
//!     .expect("item list names are unique");
//!
//! let pivot = TransformNode::new(Mat4::identity());
//! let prop = CullNode::new(
//!     Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)),
//!     &["culling"],
//! );
//! scene.add_root(&pivot).unwrap();
//! scene.add_child(&pivot, &prop).unwrap();
//!
//! scene.update(0.016);
//! assert_eq!(visibility.visible().len(), 1);
//! ```

pub mod core;
pub mod foundation;
pub mod lists;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::core::config::{Config, RegistryConfig, SceneConfig};
    pub use crate::foundation::bounds::{Aabb, Frustum, Plane};
    pub use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
    pub use crate::foundation::time::Timer;
    pub use crate::lists::{CullList, CullNode, ResponderList, ResponderNode, VisibilitySet};
    pub use crate::scene::{
        EntryId, ItemList, NodeRef, NodeType, RenderCommandBuffer, ResourceRegistry, ResourceType,
        Scene, SceneError, SceneNode, TransformNode, TreeNodeKey, View,
    };
}
