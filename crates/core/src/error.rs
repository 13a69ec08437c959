use crate::timeline::EventKind;

/// Result alias that carries the custom [`BloomVizError`] type.
pub type Result<T> = std::result::Result<T, BloomVizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum BloomVizError {
    /// The music-analysis payload failed validation. Fatal for the page that
    /// tried to mount the visual; there is no partial-timeline fallback.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The audio asset failed to load. Recoverable at the UI level.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The feature snapshot fetch failed. Degrades silently to the plain
    /// visual variant.
    #[error(transparent)]
    FlagFetch(#[from] FlagFetchError),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The analysis payload was not valid JSON.
    #[error("malformed analysis payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A music-analysis payload violated a timeline invariant. Identifies the
/// offending sequence and index so malformed analyzer output can be traced
/// back to its source instead of being silently repaired.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid {kind} sequence at index {index}: {reason}")]
pub struct ValidationError {
    pub kind: EventKind,
    pub index: usize,
    pub reason: ValidationReason,
}

/// The specific invariant a timeline event broke.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationReason {
    #[error("start {0} is negative")]
    NegativeStart(f64),
    #[error("duration {0} is negative")]
    NegativeDuration(f64),
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("event starting at {start} overlaps the previous event ending at {previous_end}")]
    Overlap { start: f64, previous_end: f64 },
    #[error("event ends at {event_end} but the track only lasts {track_duration}")]
    ExceedsTrackDuration { event_end: f64, track_duration: f64 },
    #[error("{field} has {found} values, expected {expected}")]
    BadVectorLength {
        field: &'static str,
        found: usize,
        expected: usize,
    },
}

/// The audio backend reported that the source could not be loaded. Surfaced
/// as a user-visible message; never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load audio source `{source_url}`: {message}")]
pub struct LoadError {
    pub source_url: String,
    pub message: String,
}

impl LoadError {
    pub fn new(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            message: message.into(),
        }
    }
}

/// The feature snapshot could not be fetched. Logged, never shown to the
/// end user; the session keeps the plain visual variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch feature snapshot from `{endpoint}`: {message}")]
pub struct FlagFetchError {
    pub endpoint: String,
    pub message: String,
}

impl FlagFetchError {
    pub fn new(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}
