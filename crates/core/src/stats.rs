//! Per-event statistic counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result, ValidationErrorCode};

/// Stored counter keys, grouped the way data entry groups them.
pub const STAT_FIELDS: &[&str] = &[
    // Images
    "remoteImages",
    "hostessImages",
    "selfies",
    "approvedImages",
    "rejectedImages",
    // Fans
    "indoor",
    "outdoor",
    "stadium",
    // Demographics
    "female",
    "male",
    "genAlpha",
    "genYZ",
    "genX",
    "boomer",
    // Merchandise
    "merched",
    "jersey",
    "scarf",
    "flags",
    "baseballCap",
    "other",
    // Visits
    "visitQrCode",
    "visitShortUrl",
    "visitWeb",
    "visitFacebook",
    "visitInstagram",
    "visitYoutube",
    "visitTiktok",
    "visitX",
    "visitTrustpilot",
    // Event
    "eventAttendees",
    "eventTicketPurchases",
    "eventResultHome",
    "eventResultVisitor",
    "eventValuePropositionVisited",
    "eventValuePropositionPurchases",
    // Bitly
    "bitlyTotalClicks",
    "bitlyUniqueClicks",
];

/// Fields aggregated as a mean instead of a sum.
pub const AVERAGED_FIELDS: &[&str] = &["eventResultHome", "eventResultVisitor"];

/// Totals computed from their components when not stored.
pub const DERIVED_FIELDS: &[(&str, &[&str])] = &[
    ("remoteFans", &["indoor", "outdoor"]),
    ("totalFans", &["indoor", "outdoor", "stadium"]),
    ("totalImages", &["remoteImages", "hostessImages", "selfies"]),
    ("totalUnder40", &["genAlpha", "genYZ"]),
    ("totalOver40", &["genX", "boomer"]),
    ("totalMerch", &["jersey", "scarf", "flags", "baseballCap", "other"]),
    (
        "totalVisit",
        &[
            "visitQrCode",
            "visitShortUrl",
            "visitWeb",
            "visitFacebook",
            "visitInstagram",
            "visitYoutube",
            "visitTiktok",
            "visitX",
            "visitTrustpilot",
        ],
    ),
];

/// Whether `name` is a stored or derived stat field.
pub fn is_known_field(name: &str) -> bool {
    STAT_FIELDS.contains(&name) || is_derived_field(name)
}

/// Whether `name` is a total computed from other fields.
pub fn is_derived_field(name: &str) -> bool {
    DERIVED_FIELDS.iter().any(|(derived, _)| *derived == name)
}

/// Whether `name` aggregates as a mean.
pub fn is_averaged_field(name: &str) -> bool {
    AVERAGED_FIELDS.contains(&name)
}

/// Flat map of counter name to value.
///
/// Absent keys are "no data", which is different from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Option<f64>>")]
pub struct StatRecord(BTreeMap<String, f64>);

impl From<BTreeMap<String, Option<f64>>> for StatRecord {
    fn from(raw: BTreeMap<String, Option<f64>>) -> Self {
        Self(
            raw.into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v)))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for StatRecord {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl StatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field, computing derived totals from their components.
    ///
    /// A derived total is present when at least one component is.
    pub fn get(&self, field: &str) -> Option<f64> {
        if let Some(value) = self.0.get(field) {
            return Some(*value);
        }

        let (_, components) = DERIVED_FIELDS.iter().find(|(name, _)| *name == field)?;
        let present: Vec<f64> = components.iter().filter_map(|c| self.0.get(*c)).copied().collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum())
        }
    }

    /// Value or zero, for places where absence cannot be represented.
    pub fn get_or_zero(&self, field: &str) -> f64 {
        self.get(field).unwrap_or(0.0)
    }

    pub fn set(&mut self, field: impl Into<String>, value: f64) {
        self.0.insert(field.into(), value);
    }

    /// Whether `field` is stored, ignoring derived totals.
    pub fn stores(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Stored fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject negative and non-finite counters.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in &self.0 {
            if !value.is_finite() || *value < 0.0 {
                return Err(Error::validation(
                    ValidationErrorCode::InvalidStat,
                    format!("{} must be a non-negative number, got {}", field, value),
                ));
            }
        }
        Ok(())
    }
}
