/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Base pitch of the sound being rendered (Hz)
/// - velocity: Intensity (0.0-1.0)
/// - time: Render position in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub velocity: f32,
    pub time: f64,
}

impl RenderCtx {
    /// Create context from a direct frequency (clicks never use note numbers)
    pub fn from_freq(sample_rate: f32, frequency: f32, velocity: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            velocity,
            time: 0.0,
        }
    }

    /// Same context, advanced by `frames` samples
    pub fn advanced(&self, frames: usize) -> Self {
        Self {
            time: self.time + frames as f64 / self.sample_rate as f64,
            ..*self
        }
    }
}

/// Core trait for audio processing graph nodes
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when the sound is struck
    ///
    /// Default implementation does nothing (passthrough nodes).
    fn note_on(&mut self, _ctx: &RenderCtx) {}

    /// Check if this node is still producing sound
    ///
    /// Used by the click renderer to know when a strike has rung out.
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        (**self).note_on(ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
