use crate::mapping::{synthesize, VisualParameters};
use crate::playback::{AudioBackend, DeviceProbe, PlaybackController, PlaybackState};
use crate::timeline::Timeline;
use crate::tracker::TimelineContext;

/// Receiving end of per-frame parameter writes; implemented by the shading
/// pipeline's live uniform slot.
pub trait ParameterSink {
    fn write(&mut self, params: VisualParameters);
}

/// Per-frame bridge between the audio clock and the shading pipeline.
///
/// Owns no business logic: each tick reads the current playback position,
/// recomputes parameters, and writes them to the sink. Anything short of
/// active playback degrades to the quiescent set so the render loop never
/// stalls or throws mid-frame. Lookups are O(log n); no allocation scales
/// with timeline size.
#[derive(Debug, Default)]
pub struct FrameDriver;

impl FrameDriver {
    pub fn new() -> Self {
        Self
    }

    pub fn tick<B, P, S>(
        &mut self,
        player: &PlaybackController<B, P>,
        timeline: &Timeline,
        sink: &mut S,
    ) where
        B: AudioBackend,
        P: DeviceProbe,
        S: ParameterSink,
    {
        let params = match (player.state(), player.position_seconds()) {
            (PlaybackState::Playing, Some(position)) => {
                synthesize(&TimelineContext::at(timeline, position))
            }
            _ => VisualParameters::quiescent(),
        };

        sink.write(params);
    }
}
