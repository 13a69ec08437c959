use std::fs;
use std::path::Path;

use crate::timeline::{AnalysisPayload, Timeline};
use crate::Result;

/// Reads the static music-analysis asset. Malformed JSON is a hard error;
/// the caller decides whether that blocks the page.
pub fn load_analysis(path: &Path) -> Result<AnalysisPayload> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Reads and validates the analysis asset in one step.
pub fn load_timeline(path: &Path) -> Result<Timeline> {
    let payload = load_analysis(path)?;
    Ok(Timeline::build(payload)?)
}
