//! Hashtag filters and event predicates.
//!
//! Filter terms are normalized once (trim, strip `#`, lowercase, dedupe) and
//! validated before any storage access.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::event::EventRecord;
use crate::limits::{MAX_FILTER_TERMS, MAX_TAG_LEN};

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}_-]+$").expect("invalid tag pattern"));

/// One filter term: a bare tag or a tag scoped to a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterTerm {
    Plain(String),
    Categorized { category: String, tag: String },
}

impl FilterTerm {
    /// Parse `tag`, `#tag` or `category:tag`.
    ///
    /// Returns `Ok(None)` for input that is empty after normalization.
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match trimmed.split_once(':') {
            Some((category, tag)) => {
                let category = normalize_tag(category);
                let tag = normalize_tag(tag);
                match (category.is_empty(), tag.is_empty()) {
                    (true, true) => Ok(None),
                    // `:tag` degrades to a plain tag
                    (true, false) => Ok(Some(Self::Plain(check_tag(tag)?))),
                    (false, true) => Err(Error::validation(
                        ValidationErrorCode::InvalidFormat,
                        format!("filter term '{}' has a category but no tag", raw),
                    )),
                    (false, false) => Ok(Some(Self::Categorized {
                        category: check_tag(category)?,
                        tag: check_tag(tag)?,
                    })),
                }
            }
            None => {
                let tag = normalize_tag(trimmed);
                if tag.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Self::Plain(check_tag(tag)?)))
                }
            }
        }
    }

    /// Whether the event carries this term.
    pub fn matches(&self, event: &EventRecord) -> bool {
        match self {
            Self::Plain(tag) => {
                contains_tag(&event.hashtags, tag)
                    || event
                        .categorized_hashtags
                        .values()
                        .any(|bucket| contains_tag(bucket, tag))
            }
            Self::Categorized { category, tag } => event
                .categorized_hashtags
                .iter()
                .filter(|(name, _)| normalize_tag(name) == *category)
                .any(|(_, bucket)| contains_tag(bucket, tag)),
        }
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(tag) => write!(f, "{}", tag),
            Self::Categorized { category, tag } => write!(f, "{}:{}", category, tag),
        }
    }
}

fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_lowercase()
}

fn check_tag(tag: String) -> Result<String> {
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(Error::validation(
            ValidationErrorCode::InvalidFormat,
            format!("tag exceeds {} characters", MAX_TAG_LEN),
        ));
    }
    if !TAG_REGEX.is_match(&tag) {
        return Err(Error::validation(
            ValidationErrorCode::InvalidFormat,
            format!("invalid tag '{}'", tag),
        ));
    }
    Ok(tag)
}

fn contains_tag(tags: &[String], wanted: &str) -> bool {
    tags.iter().any(|t| normalize_tag(t) == wanted)
}

/// How terms combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every term must match.
    #[default]
    All,
    /// At least one term must match.
    Any,
}

/// A validated, non-empty set of filter terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagFilter {
    terms: Vec<FilterTerm>,
    mode: MatchMode,
}

impl HashtagFilter {
    /// Normalize and validate raw terms.
    pub fn parse<S: AsRef<str>>(raw_terms: &[S], mode: MatchMode) -> Result<Self> {
        let mut terms = Vec::with_capacity(raw_terms.len());
        for raw in raw_terms {
            if let Some(term) = FilterTerm::parse(raw.as_ref())? {
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }

        if terms.is_empty() {
            return Err(Error::validation(
                ValidationErrorCode::EmptyFilter,
                "at least one non-empty hashtag is required",
            ));
        }
        if terms.len() > MAX_FILTER_TERMS {
            return Err(Error::validation(
                ValidationErrorCode::InvalidFormat,
                format!("filter has {} terms, limit is {}", terms.len(), MAX_FILTER_TERMS),
            ));
        }

        Ok(Self { terms, mode })
    }

    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        match self.mode {
            MatchMode::All => self.terms.iter().all(|t| t.matches(event)),
            MatchMode::Any => self.terms.iter().any(|t| t.matches(event)),
        }
    }
}

/// Inclusive date window; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(Error::invalid_format(format!(
                    "date window starts after it ends ({} > {})",
                    from, to
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Everything an event must satisfy to contribute to an aggregate.
#[derive(Debug, Clone, Default)]
pub struct EventPredicate {
    pub hashtags: Option<HashtagFilter>,
    pub partner_id: Option<String>,
    pub window: DateWindow,
}

impl EventPredicate {
    pub fn hashtags(filter: HashtagFilter) -> Self {
        Self {
            hashtags: Some(filter),
            ..Self::default()
        }
    }

    pub fn partner(partner_id: impl Into<String>) -> Self {
        Self {
            partner_id: Some(partner_id.into()),
            ..Self::default()
        }
    }

    pub fn within(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        if !self.window.contains(event.date) {
            return false;
        }
        if let Some(partner_id) = &self.partner_id {
            if !event.involves(partner_id) {
                return false;
            }
        }
        self.hashtags.as_ref().map_or(true, |f| f.matches(event))
    }
}
