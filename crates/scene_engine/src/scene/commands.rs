//! Backend command recording for the commit phase.
//!
//! The scene doesn't talk to a GPU; during commit each pipeline item list
//! records opaque commands into a [`RenderCommandBuffer`], bracketed by the
//! render pass markers the scene emits for pipeline render passes. A real
//! backend translates the recorded stream; tests inspect it directly.

use crate::foundation::math::Mat4;
use crate::scene::item_list::EntryId;

/// A single draw recorded by an item list during commit.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    /// Name of the item list that recorded the draw.
    pub list: String,

    /// The list's handle for the tree node being drawn.
    pub entry: EntryId,

    /// World transform to draw with.
    pub transform: Mat4,
}

/// One recorded command.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// A render pass begins; subsequent draws target it.
    BeginRenderPass(String),

    /// The named render pass ends.
    EndRenderPass(String),

    /// Draw one tracked item.
    Draw(DrawCommand),
}

/// Ordered command stream produced by one commit of a scene.
#[derive(Default)]
pub struct RenderCommandBuffer {
    commands: Vec<RenderCommand>,
}

impl RenderCommandBuffer {
    /// Create a new empty command buffer
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Create a command buffer with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Mark the beginning of a render pass.
    pub fn begin_render_pass(&mut self, name: &str) {
        self.commands
            .push(RenderCommand::BeginRenderPass(name.to_string()));
    }

    /// Mark the end of a render pass.
    pub fn end_render_pass(&mut self, name: &str) {
        self.commands
            .push(RenderCommand::EndRenderPass(name.to_string()));
    }

    /// Record a draw.
    pub fn draw(&mut self, command: DrawCommand) {
        self.commands.push(RenderCommand::Draw(command));
    }

    /// The recorded commands, in submission order.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Clear all recorded commands, keeping the allocation for the next
    /// frame.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
