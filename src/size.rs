//! Thumbnail size classes.
//!
//! A size class names one of the generation engine's fixed target
//! resolutions. It is part of the in-memory cache key and of the wire
//! contract with the engine, but not of the pending-request key (requests
//! coalesce per content identity, see `pending`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fixed thumbnail resolutions the generation engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// Blurry placeholder tier used for progressive loading (50px)
    Tiny,
    /// Grid cell tier (300px, sized for 2x DPI)
    Small,
    /// Default browsing tier (500px)
    Medium,
    /// Large preview tier (800px)
    Large,
}

impl SizeClass {
    /// Target edge length in pixels for this class.
    pub fn dimension(&self) -> u32 {
        match self {
            SizeClass::Tiny => 50,
            SizeClass::Small => 300,
            SizeClass::Medium => 500,
            SizeClass::Large => 800,
        }
    }

    /// Canonical lowercase name, as used in tokens and wire payloads.
    pub fn name(&self) -> &'static str {
        match self {
            SizeClass::Tiny => "tiny",
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }

    /// Parse a size name. Unknown or empty input yields `None`; callers
    /// that tolerate unspecified sizes fall back to [`SizeClass::default`].
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Some(SizeClass::Tiny),
            "small" => Some(SizeClass::Small),
            "medium" => Some(SizeClass::Medium),
            "large" => Some(SizeClass::Large),
            _ => None,
        }
    }
}

impl Default for SizeClass {
    /// The mid-tier class used when a request leaves the size unspecified.
    fn default() -> Self {
        SizeClass::Medium
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_parse() {
        for size in [
            SizeClass::Tiny,
            SizeClass::Small,
            SizeClass::Medium,
            SizeClass::Large,
        ] {
            assert_eq!(SizeClass::parse(size.name()), Some(size));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(SizeClass::parse("Large"), Some(SizeClass::Large));
        assert_eq!(SizeClass::parse("MEDIUM"), Some(SizeClass::Medium));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(SizeClass::parse("huge"), None);
        assert_eq!(SizeClass::parse(""), None);
    }

    #[test]
    fn default_is_medium() {
        assert_eq!(SizeClass::default(), SizeClass::Medium);
    }

    #[test]
    fn dimensions_increase_by_tier() {
        assert!(SizeClass::Tiny.dimension() < SizeClass::Small.dimension());
        assert!(SizeClass::Small.dimension() < SizeClass::Medium.dimension());
        assert!(SizeClass::Medium.dimension() < SizeClass::Large.dimension());
    }

    #[test]
    fn serializes_as_lowercase_name() {
        assert_eq!(serde_json::to_string(&SizeClass::Small).unwrap(), "\"small\"");
        let parsed: SizeClass = serde_json::from_str("\"tiny\"").unwrap();
        assert_eq!(parsed, SizeClass::Tiny);
    }
}
