use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FlagFetchError;

/// Name of the flag that selects the enhanced shader variant.
pub const SCENE_FLAG: &str = "bloom-scene";

/// Delivery state of a feature snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagStatus {
    Pending,
    Ok,
    Failed,
}

/// Point-in-time view of the remote feature flags. Replaced wholesale on
/// every update, never mutated in place; readers may hold a clone freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub status: FlagStatus,
    pub values: BTreeMap<String, String>,
}

impl FeatureSnapshot {
    /// The snapshot in force before any fetch has resolved.
    pub fn pending() -> Self {
        Self {
            status: FlagStatus::Pending,
            values: BTreeMap::new(),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: FlagStatus::Failed,
            values: BTreeMap::new(),
        }
    }

    pub fn ok(values: BTreeMap<String, String>) -> Self {
        Self {
            status: FlagStatus::Ok,
            values,
        }
    }
}

/// Flags this build actually recognizes. Anything outside this set falls
/// back to the plain variant instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizedFlag {
    BloomScene,
}

impl RecognizedFlag {
    fn parse(name: &str) -> Option<Self> {
        match name {
            SCENE_FLAG => Some(Self::BloomScene),
            _ => None,
        }
    }
}

/// Visual variant the gate can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualVariant {
    /// Unflagged fallback; always safe to mount.
    #[default]
    Plain,
    /// The timeline-driven shader surface.
    Bloom,
}

/// Decides which visual variant mounts for a given snapshot.
///
/// A `Pending` snapshot never blocks first paint: the plain variant renders
/// until the fetch resolves. `Failed` pins the plain variant for the rest of
/// the session. Unrecognized flag names or values degrade to plain.
pub fn select_variant(snapshot: &FeatureSnapshot) -> VisualVariant {
    match snapshot.status {
        FlagStatus::Pending | FlagStatus::Failed => VisualVariant::Plain,
        FlagStatus::Ok => snapshot
            .values
            .iter()
            .find_map(|(name, value)| match RecognizedFlag::parse(name)? {
                RecognizedFlag::BloomScene => match value.as_str() {
                    "on" | "true" | "enabled" => Some(VisualVariant::Bloom),
                    _ => None,
                },
            })
            .unwrap_or(VisualVariant::Plain),
    }
}

/// Transport seam for the remote flag service.
pub trait FlagClient {
    fn fetch_snapshot(&mut self, endpoint: &str) -> Result<FeatureSnapshot, FlagFetchError>;
}

/// Session-scoped flag cache: fetch once, keep the result, never revalidate.
///
/// A failed fetch is logged and cached as a `Failed` snapshot, so the plain
/// variant stays mounted for the session without surfacing an error to the
/// user.
pub struct SessionFlags<C: FlagClient> {
    client: C,
    endpoint: String,
    cached: Option<FeatureSnapshot>,
}

impl<C: FlagClient> SessionFlags<C> {
    pub fn new(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            cached: None,
        }
    }

    /// Returns the session snapshot, fetching it on first use.
    pub fn snapshot(&mut self) -> &FeatureSnapshot {
        if self.cached.is_none() {
            let snapshot = match self.client.fetch_snapshot(&self.endpoint) {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    tracing::warn!(%error, "flag fetch failed, keeping plain variant");
                    FeatureSnapshot::failed()
                }
            };
            self.cached = Some(snapshot);
        }
        self.cached.as_ref().expect("snapshot populated above")
    }

    /// The variant this session mounts.
    pub fn variant(&mut self) -> VisualVariant {
        select_variant(self.snapshot())
    }
}
