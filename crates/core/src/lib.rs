//! Core library for the Bloom Visualiser.
//!
//! The crate implements a timeline-synchronized shader driver: a precomputed
//! music-analysis payload is validated into an immutable [`timeline::Timeline`],
//! the [`playback`] controller tracks the audio clock against it, and each
//! frame the [`frame::FrameDriver`] turns the current position into
//! [`mapping::VisualParameters`] and writes them into the shading pipeline's
//! uniform slot. The [`flags`] module decides which visual variant mounts in
//! the first place. Everything runs single-threaded and cooperatively; time
//! and audio are injected through narrow traits so the whole lifecycle is
//! drivable from tests.

pub mod assets;
pub mod config;
pub mod error;
pub mod flags;
pub mod frame;
pub mod mapping;
pub mod playback;
pub mod render;
pub mod scene;
pub mod timeline;
pub mod tracker;

pub use config::{AppConfig, FlagConfig, PlaybackConfig};
pub use error::{BloomVizError, FlagFetchError, LoadError, Result, ValidationError};
pub use flags::{select_variant, FeatureSnapshot, FlagClient, FlagStatus, SessionFlags, VisualVariant};
pub use frame::{FrameDriver, ParameterSink};
pub use mapping::{synthesize, VisualParameters, QUIESCENT_INTENSITY};
pub use playback::{
    AudioBackend, AudioFormat, DeviceProbe, OfflineBackend, PlaybackController, PlaybackState,
    StaticDeviceProbe,
};
pub use render::{RenderGraph, UniformSlot};
pub use scene::{SceneDescriptor, SceneInstance, SceneKind};
pub use timeline::{AnalysisPayload, EventKind, EventRef, Timeline, TimelineEvent};
pub use tracker::TimelineContext;
