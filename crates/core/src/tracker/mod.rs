use crate::timeline::{Bar, Beat, Segment, Timeline};

/// Snapshot of where the audio clock sits inside the analysis timeline.
///
/// Built fresh every frame from a raw position read; carries no state of its
/// own, so a seek simply produces a new context with no smoothing residue.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineContext {
    pub position_seconds: f64,
    pub segment: Option<Segment>,
    pub beat: Option<Beat>,
    pub bar: Option<Bar>,
    /// Normalized progress through the current beat, in `[0, 1)`. Zero when
    /// no beat is active or the beat has zero duration.
    pub phase: f64,
}

impl TimelineContext {
    /// Resolves the active segment, beat, and bar for `position_seconds` and
    /// derives the beat phase. Positions outside every event of a kind leave
    /// that slot empty rather than erroring.
    pub fn at(timeline: &Timeline, position_seconds: f64) -> Self {
        let segment = timeline.segment_at(position_seconds).cloned();
        let beat = timeline.beat_at(position_seconds).cloned();
        let bar = timeline.bar_at(position_seconds).cloned();
        let phase = beat
            .as_ref()
            .map(|beat| beat_phase(beat, position_seconds))
            .unwrap_or(0.0);

        Self {
            position_seconds,
            segment,
            beat,
            bar,
            phase,
        }
    }

    /// A context with no active events, as produced past the end of the
    /// track or before its first event.
    pub fn idle(position_seconds: f64) -> Self {
        Self {
            position_seconds,
            segment: None,
            beat: None,
            bar: None,
            phase: 0.0,
        }
    }
}

fn beat_phase(beat: &Beat, position_seconds: f64) -> f64 {
    if beat.duration <= 0.0 {
        return 0.0;
    }
    ((position_seconds - beat.start) / beat.duration).clamp(0.0, 1.0 - f64::EPSILON)
}
