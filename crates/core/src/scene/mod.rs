use serde::{Deserialize, Serialize};

use crate::flags::VisualVariant;
use crate::mapping::VisualParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneKind {
    /// Static backdrop mounted while flags are pending, failed, or absent.
    PlainBackdrop,
    /// Timeline-driven procedural shader surface.
    BloomSurface,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub name: String,
    pub kind: SceneKind,
}

impl SceneDescriptor {
    pub fn plain() -> Self {
        Self {
            name: "Plain Backdrop".to_string(),
            kind: SceneKind::PlainBackdrop,
        }
    }

    pub fn bloom() -> Self {
        Self {
            name: "Bloom Surface".to_string(),
            kind: SceneKind::BloomSurface,
        }
    }

    /// Descriptor for the variant the capability gate selected.
    pub fn for_variant(variant: VisualVariant) -> Self {
        match variant {
            VisualVariant::Plain => Self::plain(),
            VisualVariant::Bloom => Self::bloom(),
        }
    }
}

/// Mounted scene holding the live copy of the procedural parameters.
#[derive(Debug, Clone)]
pub struct SceneInstance {
    pub descriptor: SceneDescriptor,
    pub params: VisualParameters,
}

impl SceneInstance {
    pub fn new(descriptor: SceneDescriptor) -> Self {
        Self {
            descriptor,
            params: VisualParameters::quiescent(),
        }
    }

    /// Mounts the scene matching the gate's decision.
    pub fn mount(variant: VisualVariant) -> Self {
        Self::new(SceneDescriptor::for_variant(variant))
    }

    pub fn apply(&mut self, params: VisualParameters) {
        self.params = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{select_variant, FeatureSnapshot};

    #[test]
    fn pending_flags_mount_the_plain_backdrop() {
        let variant = select_variant(&FeatureSnapshot::pending());
        let scene = SceneInstance::mount(variant);

        assert_eq!(scene.descriptor.kind, SceneKind::PlainBackdrop);
        assert_eq!(scene.params, VisualParameters::quiescent());
    }

    #[test]
    fn apply_replaces_the_live_parameters() {
        let mut scene = SceneInstance::new(SceneDescriptor::bloom());
        let params = VisualParameters {
            elevation_phase: 0.5,
            color_phase: 0.25,
            intensity: 0.8,
        };

        scene.apply(params);
        assert_eq!(scene.params, params);
    }
}
