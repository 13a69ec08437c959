use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationReason};

/// Tolerance applied to ordering and bounds checks. Real analyzer payloads
/// carry float noise in the last digits of adjacent event boundaries.
const ORDERING_EPSILON: f64 = 1e-6;

/// Number of entries expected in a segment's `pitches` and `timbre` vectors.
pub const CHROMA_BINS: usize = 12;

/// Identifies one of the five event sequences carried by a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Bar,
    Beat,
    Section,
    Segment,
    Tatum,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Bar => "bars",
            EventKind::Beat => "beats",
            EventKind::Section => "sections",
            EventKind::Segment => "segments",
            EventKind::Tatum => "tatums",
        };
        f.write_str(name)
    }
}

/// Raw music-analysis payload as delivered by the static JSON asset. The
/// shape follows the analyzer output verbatim; [`Timeline::build`] is the
/// only way to turn it into something queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub meta: Meta,
    pub track: TrackInfo,
    #[serde(default)]
    pub bars: Vec<Bar>,
    #[serde(default)]
    pub beats: Vec<Beat>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub tatums: Vec<Tatum>,
}

/// Analyzer identity and status. Never consulted by rendering logic but
/// preserved so diagnostics can name the producer of a bad payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub analyzer_version: String,
    pub platform: String,
    pub detailed_status: String,
    pub status_code: i64,
    pub timestamp: i64,
    pub analysis_time: f64,
    pub input_process: String,
}

/// Whole-track metadata from the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackInfo {
    pub num_samples: u64,
    pub duration: f64,
    pub offset_seconds: f64,
    pub window_seconds: f64,
    pub analysis_sample_rate: f64,
    pub analysis_channels: u32,
    pub end_of_fade_in: f64,
    pub start_of_fade_out: f64,
    pub loudness: f64,
    pub tempo: f64,
    pub tempo_confidence: f64,
    pub time_signature: u32,
    pub time_signature_confidence: f64,
    pub key: i32,
    pub key_confidence: f64,
    pub mode: i32,
    pub mode_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub start: f64,
    pub duration: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    pub start: f64,
    pub duration: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tatum {
    pub start: f64,
    pub duration: f64,
    pub confidence: f64,
}

/// Large-scale structural division (intro, chorus, ...) with its own local
/// tempo and key estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub start: f64,
    pub duration: f64,
    pub confidence: f64,
    #[serde(default)]
    pub loudness: f64,
    #[serde(default)]
    pub tempo: f64,
    #[serde(default)]
    pub tempo_confidence: f64,
    #[serde(default)]
    pub key: i32,
    #[serde(default)]
    pub key_confidence: f64,
    #[serde(default)]
    pub mode: i32,
    #[serde(default)]
    pub mode_confidence: f64,
    #[serde(default)]
    pub time_signature: u32,
    #[serde(default)]
    pub time_signature_confidence: f64,
}

/// Short, roughly-uniform slice of audio with loudness contour and
/// chroma/timbre descriptors. The finest-grained structural unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub duration: f64,
    pub confidence: f64,
    pub loudness_start: f64,
    pub loudness_max_time: f64,
    pub loudness_max: f64,
    pub loudness_end: f64,
    pub pitches: Vec<f64>,
    pub timbre: Vec<f64>,
}

/// Shared shape of all five timeline event kinds.
pub trait TimelineEvent {
    fn start(&self) -> f64;
    fn duration(&self) -> f64;
    fn confidence(&self) -> f64;

    fn end(&self) -> f64 {
        self.start() + self.duration()
    }
}

macro_rules! impl_timeline_event {
    ($($ty:ty),+) => {
        $(impl TimelineEvent for $ty {
            fn start(&self) -> f64 {
                self.start
            }

            fn duration(&self) -> f64 {
                self.duration
            }

            fn confidence(&self) -> f64 {
                self.confidence
            }
        })+
    };
}

impl_timeline_event!(Bar, Beat, Section, Segment, Tatum);

/// Borrowed view of an event returned by the kind-generic lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventRef<'a> {
    Bar(&'a Bar),
    Beat(&'a Beat),
    Section(&'a Section),
    Segment(&'a Segment),
    Tatum(&'a Tatum),
}

impl EventRef<'_> {
    pub fn start(&self) -> f64 {
        match self {
            EventRef::Bar(e) => e.start,
            EventRef::Beat(e) => e.start,
            EventRef::Section(e) => e.start,
            EventRef::Segment(e) => e.start,
            EventRef::Tatum(e) => e.start,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            EventRef::Bar(e) => e.duration,
            EventRef::Beat(e) => e.duration,
            EventRef::Section(e) => e.duration,
            EventRef::Segment(e) => e.duration,
            EventRef::Tatum(e) => e.duration,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            EventRef::Bar(e) => e.confidence,
            EventRef::Beat(e) => e.confidence,
            EventRef::Section(e) => e.confidence,
            EventRef::Segment(e) => e.confidence,
            EventRef::Tatum(e) => e.confidence,
        }
    }
}

/// Validated, immutable music-analysis timeline. Construction is the only
/// mutation point; afterwards any number of readers may query it.
#[derive(Debug, Clone)]
pub struct Timeline {
    meta: Meta,
    track: TrackInfo,
    bars: Vec<Bar>,
    beats: Vec<Beat>,
    sections: Vec<Section>,
    segments: Vec<Segment>,
    tatums: Vec<Tatum>,
}

impl Timeline {
    /// Validates the payload and indexes it for lookup. A payload that is
    /// unsorted, overlapping, out of bounds, or carries malformed segment
    /// vectors is rejected outright; the error names the sequence and index
    /// that broke the invariant.
    pub fn build(payload: AnalysisPayload) -> Result<Self, ValidationError> {
        let duration = payload.track.duration;
        validate_sequence(EventKind::Bar, &payload.bars, duration)?;
        validate_sequence(EventKind::Beat, &payload.beats, duration)?;
        validate_sequence(EventKind::Section, &payload.sections, duration)?;
        validate_sequence(EventKind::Segment, &payload.segments, duration)?;
        validate_sequence(EventKind::Tatum, &payload.tatums, duration)?;

        for (index, segment) in payload.segments.iter().enumerate() {
            for (field, values) in [("pitches", &segment.pitches), ("timbre", &segment.timbre)] {
                if values.len() != CHROMA_BINS {
                    return Err(ValidationError {
                        kind: EventKind::Segment,
                        index,
                        reason: ValidationReason::BadVectorLength {
                            field,
                            found: values.len(),
                            expected: CHROMA_BINS,
                        },
                    });
                }
            }
        }

        Ok(Self {
            meta: payload.meta,
            track: payload.track,
            bars: payload.bars,
            beats: payload.beats,
            sections: payload.sections,
            segments: payload.segments,
            tatums: payload.tatums,
        })
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    /// Returns the event of `kind` whose `[start, start + duration)` interval
    /// contains `seconds`, or `None` outside every interval of that kind.
    pub fn event_at(&self, kind: EventKind, seconds: f64) -> Option<EventRef<'_>> {
        match kind {
            EventKind::Bar => find_at(&self.bars, seconds).map(EventRef::Bar),
            EventKind::Beat => find_at(&self.beats, seconds).map(EventRef::Beat),
            EventKind::Section => find_at(&self.sections, seconds).map(EventRef::Section),
            EventKind::Segment => find_at(&self.segments, seconds).map(EventRef::Segment),
            EventKind::Tatum => find_at(&self.tatums, seconds).map(EventRef::Tatum),
        }
    }

    /// Start time of the first event of `kind` strictly after `seconds`.
    /// Used for lookahead effects.
    pub fn next_boundary(&self, kind: EventKind, seconds: f64) -> Option<f64> {
        match kind {
            EventKind::Bar => find_next(&self.bars, seconds),
            EventKind::Beat => find_next(&self.beats, seconds),
            EventKind::Section => find_next(&self.sections, seconds),
            EventKind::Segment => find_next(&self.segments, seconds),
            EventKind::Tatum => find_next(&self.tatums, seconds),
        }
    }

    pub fn event_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Bar => self.bars.len(),
            EventKind::Beat => self.beats.len(),
            EventKind::Section => self.sections.len(),
            EventKind::Segment => self.segments.len(),
            EventKind::Tatum => self.tatums.len(),
        }
    }

    pub fn bar_at(&self, seconds: f64) -> Option<&Bar> {
        find_at(&self.bars, seconds)
    }

    pub fn beat_at(&self, seconds: f64) -> Option<&Beat> {
        find_at(&self.beats, seconds)
    }

    pub fn section_at(&self, seconds: f64) -> Option<&Section> {
        find_at(&self.sections, seconds)
    }

    pub fn segment_at(&self, seconds: f64) -> Option<&Segment> {
        find_at(&self.segments, seconds)
    }

    pub fn tatum_at(&self, seconds: f64) -> Option<&Tatum> {
        find_at(&self.tatums, seconds)
    }
}

fn validate_sequence<E: TimelineEvent>(
    kind: EventKind,
    events: &[E],
    track_duration: f64,
) -> Result<(), ValidationError> {
    let fail = |index: usize, reason: ValidationReason| ValidationError { kind, index, reason };

    let mut previous_end = f64::NEG_INFINITY;
    for (index, event) in events.iter().enumerate() {
        if event.start() < 0.0 {
            return Err(fail(index, ValidationReason::NegativeStart(event.start())));
        }
        if event.duration() < 0.0 {
            return Err(fail(
                index,
                ValidationReason::NegativeDuration(event.duration()),
            ));
        }
        if !(0.0..=1.0).contains(&event.confidence()) {
            return Err(fail(
                index,
                ValidationReason::ConfidenceOutOfRange(event.confidence()),
            ));
        }
        if event.start() + ORDERING_EPSILON < previous_end {
            return Err(fail(
                index,
                ValidationReason::Overlap {
                    start: event.start(),
                    previous_end,
                },
            ));
        }
        if event.end() > track_duration + ORDERING_EPSILON {
            return Err(fail(
                index,
                ValidationReason::ExceedsTrackDuration {
                    event_end: event.end(),
                    track_duration,
                },
            ));
        }
        previous_end = previous_end.max(event.end());
    }

    Ok(())
}

/// Binary search over a sorted sequence for the event containing `seconds`.
fn find_at<E: TimelineEvent>(events: &[E], seconds: f64) -> Option<&E> {
    if !seconds.is_finite() {
        return None;
    }

    let index = match events.binary_search_by(|event| {
        event
            .start()
            .partial_cmp(&seconds)
            .unwrap_or(Ordering::Equal)
    }) {
        Ok(index) => index,
        Err(0) => return None,
        Err(index) => index - 1,
    };

    let event = &events[index];
    if seconds >= event.start() && seconds < event.end() {
        Some(event)
    } else {
        None
    }
}

fn find_next<E: TimelineEvent>(events: &[E], seconds: f64) -> Option<f64> {
    if !seconds.is_finite() {
        return None;
    }

    let index = events.partition_point(|event| event.start() <= seconds);
    events.get(index).map(|event| event.start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(start: f64, duration: f64) -> Beat {
        Beat {
            start,
            duration,
            confidence: 1.0,
        }
    }

    fn segment(start: f64, duration: f64) -> Segment {
        Segment {
            start,
            duration,
            confidence: 0.9,
            loudness_start: -20.0,
            loudness_max_time: 0.1,
            loudness_max: -5.0,
            loudness_end: -25.0,
            pitches: vec![0.5; CHROMA_BINS],
            timbre: vec![0.0; CHROMA_BINS],
        }
    }

    fn payload(duration: f64) -> AnalysisPayload {
        AnalysisPayload {
            meta: Meta::default(),
            track: TrackInfo {
                duration,
                tempo: 120.0,
                loudness: -8.0,
                ..TrackInfo::default()
            },
            bars: Vec::new(),
            beats: Vec::new(),
            sections: Vec::new(),
            segments: Vec::new(),
            tatums: Vec::new(),
        }
    }

    #[test]
    fn builds_from_empty_sequences() {
        let timeline = Timeline::build(payload(10.0)).unwrap();
        assert!(timeline.event_at(EventKind::Beat, 1.0).is_none());
        assert!(timeline.next_boundary(EventKind::Segment, 0.0).is_none());
    }

    #[test]
    fn rejects_overlapping_events() {
        let mut p = payload(10.0);
        p.beats = vec![beat(0.0, 2.0), beat(1.5, 1.0)];

        let err = Timeline::build(p).unwrap_err();
        assert_eq!(err.kind, EventKind::Beat);
        assert_eq!(err.index, 1);
        assert!(matches!(err.reason, ValidationReason::Overlap { .. }));
    }

    #[test]
    fn rejects_unsorted_events() {
        let mut p = payload(10.0);
        p.bars = vec![
            Bar {
                start: 4.0,
                duration: 0.0,
                confidence: 0.5,
            },
            Bar {
                start: 1.0,
                duration: 0.0,
                confidence: 0.5,
            },
        ];

        let err = Timeline::build(p).unwrap_err();
        assert_eq!(err.kind, EventKind::Bar);
        assert_eq!(err.index, 1);
    }

    #[test]
    fn rejects_events_past_track_end() {
        let mut p = payload(3.0);
        p.tatums = vec![Tatum {
            start: 2.5,
            duration: 1.0,
            confidence: 0.2,
        }];

        let err = Timeline::build(p).unwrap_err();
        assert_eq!(err.kind, EventKind::Tatum);
        assert!(matches!(
            err.reason,
            ValidationReason::ExceedsTrackDuration { .. }
        ));
    }

    #[test]
    fn rejects_confidence_outside_unit_interval() {
        let mut p = payload(10.0);
        p.beats = vec![Beat {
            start: 0.0,
            duration: 1.0,
            confidence: 1.5,
        }];

        let err = Timeline::build(p).unwrap_err();
        assert!(matches!(
            err.reason,
            ValidationReason::ConfidenceOutOfRange(_)
        ));
    }

    #[test]
    fn rejects_short_pitch_vectors() {
        let mut p = payload(10.0);
        let mut seg = segment(0.0, 5.0);
        seg.pitches.truncate(7);
        p.segments = vec![seg];

        let err = Timeline::build(p).unwrap_err();
        assert_eq!(err.kind, EventKind::Segment);
        assert!(matches!(
            err.reason,
            ValidationReason::BadVectorLength {
                field: "pitches",
                found: 7,
                ..
            }
        ));
    }

    #[test]
    fn tolerates_float_noise_at_boundaries() {
        let mut p = payload(10.0);
        // Adjacent events whose shared boundary disagrees in the last digits.
        p.beats = vec![beat(0.0, 2.0000000001), beat(2.0, 2.0)];

        assert!(Timeline::build(p).is_ok());
    }

    #[test]
    fn event_at_respects_half_open_intervals() {
        let mut p = payload(20.0);
        p.beats = vec![beat(10.0, 2.0), beat(12.0, 2.0)];
        let timeline = Timeline::build(p).unwrap();

        let at = |t: f64| {
            timeline
                .event_at(EventKind::Beat, t)
                .map(|event| event.start())
        };

        assert_eq!(at(10.0), Some(10.0));
        assert_eq!(at(11.999_999), Some(10.0));
        // Exclusive end belongs to the next beat.
        assert_eq!(at(12.0), Some(12.0));
        assert_eq!(at(9.999), None);
        assert_eq!(at(14.0), None);
    }

    #[test]
    fn zero_duration_event_contains_nothing() {
        let mut p = payload(20.0);
        p.beats = vec![beat(5.0, 0.0)];
        let timeline = Timeline::build(p).unwrap();

        assert!(timeline.event_at(EventKind::Beat, 5.0).is_none());
    }

    #[test]
    fn next_boundary_is_strictly_after() {
        let mut p = payload(20.0);
        p.bars = vec![
            Bar {
                start: 0.0,
                duration: 4.0,
                confidence: 0.8,
            },
            Bar {
                start: 4.0,
                duration: 4.0,
                confidence: 0.8,
            },
        ];
        let timeline = Timeline::build(p).unwrap();

        assert_eq!(timeline.next_boundary(EventKind::Bar, 0.0), Some(4.0));
        assert_eq!(timeline.next_boundary(EventKind::Bar, 4.0), None);
        assert_eq!(timeline.next_boundary(EventKind::Bar, -1.0), Some(0.0));
    }

    #[test]
    fn deserializes_analyzer_payload() {
        let json = r#"{
            "meta": {"analyzer_version": "4.0.0", "platform": "Linux"},
            "track": {"duration": 12.5, "tempo": 98.0, "loudness": -7.3},
            "beats": [{"start": 0.5, "duration": 0.6, "confidence": 0.95}],
            "segments": []
        }"#;

        let payload: AnalysisPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.meta.analyzer_version, "4.0.0");
        assert_eq!(payload.beats.len(), 1);

        let timeline = Timeline::build(payload).unwrap();
        assert!((timeline.track().tempo - 98.0).abs() < f64::EPSILON);
    }
}
