use crate::frame::ParameterSink;
use crate::mapping::VisualParameters;
use crate::scene::SceneInstance;
use crate::Result;

/// The shading pipeline's live parameter slot. Holds exactly the latest
/// write; the frame driver replaces it wholesale every frame.
#[derive(Debug, Default)]
pub struct UniformSlot {
    latest: VisualParameters,
}

impl UniformSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> VisualParameters {
        self.latest
    }
}

impl ParameterSink for UniformSlot {
    fn write(&mut self, params: VisualParameters) {
        self.latest = params;
    }
}

/// Opaque boundary to the shading pipeline: one mounted scene plus its
/// uniform slot. Pixel-level work happens on the other side of `draw`.
#[derive(Debug)]
pub struct RenderGraph {
    scene: SceneInstance,
    slot: UniformSlot,
}

impl RenderGraph {
    pub fn mount(scene: SceneInstance) -> Self {
        Self {
            scene,
            slot: UniformSlot::new(),
        }
    }

    pub fn scene(&self) -> &SceneInstance {
        &self.scene
    }

    pub fn latest(&self) -> VisualParameters {
        self.slot.latest()
    }

    pub fn draw(&self) -> Result<()> {
        // The GPU dispatch lives behind this boundary; the core only
        // guarantees the slot holds this frame's parameters before present.
        Ok(())
    }
}

impl ParameterSink for RenderGraph {
    fn write(&mut self, params: VisualParameters) {
        self.slot.write(params);
        self.scene.apply(params);
    }
}
