//! Per-frame responder callbacks driven in explicit priority order.
//!
//! Most item lists make no ordering guarantee over their entries. A
//! [`ResponderList`] is the exception: it invokes each tracked
//! [`ResponderNode`]'s callback every frame in ascending priority order,
//! stable for equal priorities (insertion order breaks ties). Animation
//! controllers that must run before the rigs they feed are the typical use.

use crate::foundation::math::Mat4;
use crate::scene::{
    AddNodeContext, EntryId, EntryStore, ItemData, ItemList, NodeRef, NodeType, SceneNode,
    TreeNodeKey,
};

/// Type tag for responder nodes.
pub static RESPONDER_NODE_TYPE: NodeType = NodeType::new("responder");

/// Per-frame callback: delta time and the instantiation's world transform.
pub type ResponderCallback = Box<dyn Fn(f32, &Mat4) + Send + Sync>;

/// Payload for nodes that want a per-frame callback.
pub struct ResponderNode {
    priority: i32,
    callback: ResponderCallback,
}

impl ResponderNode {
    /// Create a responder node definition. Lower priorities run first each
    /// frame.
    pub fn new(
        priority: i32,
        item_lists: &[&str],
        callback: impl Fn(f32, &Mat4) + Send + Sync + 'static,
    ) -> NodeRef {
        SceneNode::new(&RESPONDER_NODE_TYPE, item_lists, Self {
            priority,
            callback: Box::new(callback),
        })
    }

    /// The responder's priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

struct ResponderEntry {
    node: NodeRef,
    world: Mat4,
}

/// Item list invoking responder callbacks in priority order.
pub struct ResponderList {
    name: String,
    entries: EntryStore<ResponderEntry>,
    // Invocation order: ascending (priority, insertion sequence).
    order: Vec<(i32, u64, EntryId)>,
    next_sequence: u64,
}

impl ResponderList {
    /// Create a responder list with the given registration name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: EntryStore::new(),
            order: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Number of tracked responders.
    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }
}

impl ItemList for ResponderList {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_node(&mut self, ctx: AddNodeContext<'_>) -> Option<(EntryId, Option<ItemData>)> {
        let responder = ctx.node.payload::<ResponderNode>()?;
        let priority = responder.priority;

        let entry = self.entries.insert(ResponderEntry {
            node: ctx.node.clone(),
            world: *ctx.world,
        });

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let position = self
            .order
            .partition_point(|(other, _, _)| *other <= priority);
        self.order.insert(position, (priority, sequence, entry));

        Some((entry, None))
    }

    fn update_node(&mut self, entry: EntryId, _key: TreeNodeKey, world: &Mat4) {
        if let Some(responder) = self.entries.get_mut(entry) {
            responder.world = *world;
        }
    }

    fn remove_node(&mut self, entry: EntryId) {
        self.entries.defer_remove(entry);
    }

    fn pre_transform_update(&mut self, _delta_time: f32) {
        if self.entries.flush_removals() > 0 {
            let entries = &self.entries;
            self.order.retain(|(_, _, entry)| entries.get(*entry).is_some());
        }
    }

    fn update(&mut self, delta_time: f32) {
        for (_, _, entry) in &self.order {
            let Some(responder) = self.entries.get(*entry) else {
                continue;
            };
            // Payload is always a ResponderNode; add_node filtered on it.
            if let Some(node) = responder.node.payload::<ResponderNode>() {
                (node.callback)(delta_time, &responder.world);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use std::sync::{Arc, Mutex};

    fn recording_responder(
        priority: i32,
        tag: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> NodeRef {
        let log = log.clone();
        ResponderNode::new(priority, &["responders"], move |_, _| {
            log.lock().unwrap().push(tag);
        })
    }

    #[test]
    fn test_responders_run_in_priority_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scene = Scene::builder()
            .compute(Box::new(ResponderList::new("responders")))
            .build()
            .unwrap();

        // Added in scrambled order; priorities decide invocation order.
        let late = recording_responder(10, "late", &log);
        let early = recording_responder(-5, "early", &log);
        let middle = recording_responder(0, "middle", &log);
        scene.add_root(&late).unwrap();
        scene.add_root(&early).unwrap();
        scene.add_root(&middle).unwrap();

        scene.update(0.016);
        assert_eq!(*log.lock().unwrap(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scene = Scene::builder()
            .compute(Box::new(ResponderList::new("responders")))
            .build()
            .unwrap();

        let first = recording_responder(0, "first", &log);
        let second = recording_responder(0, "second", &log);
        scene.add_root(&first).unwrap();
        scene.add_root(&second).unwrap();

        scene.update(0.016);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_removed_responder_stops_running() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scene = Scene::builder()
            .compute(Box::new(ResponderList::new("responders")))
            .build()
            .unwrap();

        let keep = recording_responder(0, "keep", &log);
        let drop_me = recording_responder(1, "drop", &log);
        scene.add_root(&keep).unwrap();
        scene.add_root(&drop_me).unwrap();

        scene.update(0.016);
        scene.remove_root(&drop_me).unwrap();
        scene.update(0.016);

        assert_eq!(*log.lock().unwrap(), vec!["keep", "drop", "keep"]);
    }
}
