use serde::{Deserialize, Serialize};

/// Canonical form of one volcano in the alert-level feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolcanoRecord {
    /// Stable volcano ID (e.g. `whiteisland`).
    pub id: String,
    /// Display title as published by the feed.
    pub title: String,
    /// Volcanic alert level.
    pub level: u32,
    /// Free-text description of current activity.
    pub activity: String,
}

impl VolcanoRecord {
    /// Public GeoNet page for the volcano.
    pub fn url(&self) -> String {
        format!("https://www.geonet.org.nz/volcano/{}", self.id)
    }
}

/// Wording for an alert-level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertDirection {
    /// The level went up.
    Upgraded,
    /// The level went down, or stayed the same.
    Downgraded,
}

impl AlertDirection {
    /// Derives the direction from an old and a new level.
    ///
    /// Equal levels read as [`AlertDirection::Downgraded`].
    pub fn between(old_level: u32, new_level: u32) -> Self {
        if new_level > old_level {
            Self::Upgraded
        } else {
            Self::Downgraded
        }
    }

    /// Verb used in notification text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upgraded => "upgraded",
            Self::Downgraded => "downgraded",
        }
    }
}

impl std::fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
