use serde::{Deserialize, Serialize};

use crate::tracker::TimelineContext;

/// Intensity reported while nothing in the timeline is active. Keeps the
/// surface faintly alive instead of going fully dark.
pub const QUIESCENT_INTENSITY: f32 = 0.05;

/// Loudness range, in dB, that segment peaks are normalized against.
const LOUDNESS_FLOOR_DB: f64 = -60.0;
const LOUDNESS_CEILING_DB: f64 = 0.0;

/// Procedural parameters handed to the shading pipeline each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualParameters {
    /// Periodic driver for surface elevation; the beat phase.
    pub elevation_phase: f32,
    /// Slower periodic driver for palette rotation; progress through the
    /// current bar, falling back to the beat phase when no bar is active.
    pub color_phase: f32,
    /// Overall modulation depth in `[QUIESCENT_INTENSITY, 1]`.
    pub intensity: f32,
}

impl VisualParameters {
    /// The neutral set written whenever no valid timeline context exists:
    /// phases frozen at zero, intensity at the quiescent floor.
    pub fn quiescent() -> Self {
        Self {
            elevation_phase: 0.0,
            color_phase: 0.0,
            intensity: QUIESCENT_INTENSITY,
        }
    }
}

impl Default for VisualParameters {
    fn default() -> Self {
        Self::quiescent()
    }
}

/// Maps a timeline context to visual parameters.
///
/// Deterministic and free of playback or rendering state, so it can be
/// exercised without a render loop or audio device. Formulas:
///
/// - `elevation_phase` is the beat phase.
/// - `color_phase` is `(position - bar.start) / bar.duration` clamped to
///   `[0, 1)`, or the beat phase when no bar is active.
/// - `intensity` blends from the quiescent floor toward 1.0 by
///   `confidence * loudness_norm`, where `loudness_norm` maps the segment's
///   `loudness_max` from [-60 dB, 0 dB] into [0, 1]. Low-confidence analysis
///   therefore dampens the visual rather than jittering it.
pub fn synthesize(context: &TimelineContext) -> VisualParameters {
    let elevation_phase = context.phase as f32;

    let color_phase = context
        .bar
        .as_ref()
        .map(|bar| bar_progress(bar.start, bar.duration, context.position_seconds))
        .unwrap_or(context.phase) as f32;

    let intensity = context
        .segment
        .as_ref()
        .map(|segment| {
            let loudness_norm = ((segment.loudness_max - LOUDNESS_FLOOR_DB)
                / (LOUDNESS_CEILING_DB - LOUDNESS_FLOOR_DB))
                .clamp(0.0, 1.0);
            let drive = (segment.confidence * loudness_norm) as f32;
            QUIESCENT_INTENSITY + drive * (1.0 - QUIESCENT_INTENSITY)
        })
        .unwrap_or(QUIESCENT_INTENSITY);

    VisualParameters {
        elevation_phase,
        color_phase,
        intensity,
    }
}

fn bar_progress(start: f64, duration: f64, position: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    ((position - start) / duration).clamp(0.0, 1.0 - f64::EPSILON)
}
