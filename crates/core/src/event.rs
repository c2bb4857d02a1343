//! Event documents that own a StatRecord.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::StatRecord;

/// Which side of a fixture a partner played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

/// One event with its tags and counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    /// Home partner
    #[serde(default)]
    pub partner_id: Option<String>,
    /// Away partner
    #[serde(default)]
    pub opponent_id: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub categorized_hashtags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub stats: StatRecord,
}

impl EventRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date,
            partner_id: None,
            opponent_id: None,
            hashtags: Vec::new(),
            categorized_hashtags: BTreeMap::new(),
            stats: StatRecord::new(),
        }
    }

    pub fn with_partner(mut self, partner_id: impl Into<String>) -> Self {
        self.partner_id = Some(partner_id.into());
        self
    }

    pub fn with_opponent(mut self, opponent_id: impl Into<String>) -> Self {
        self.opponent_id = Some(opponent_id.into());
        self
    }

    pub fn with_hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category<I, S>(mut self, category: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorized_hashtags
            .insert(category.into(), tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_stats(mut self, stats: StatRecord) -> Self {
        self.stats = stats;
        self
    }

    /// Side the partner played on, if it took part at all.
    pub fn venue_for(&self, partner_id: &str) -> Option<Venue> {
        if self.partner_id.as_deref() == Some(partner_id) {
            Some(Venue::Home)
        } else if self.opponent_id.as_deref() == Some(partner_id) {
            Some(Venue::Away)
        } else {
            None
        }
    }

    pub fn involves(&self, partner_id: &str) -> bool {
        self.venue_for(partner_id).is_some()
    }
}
