//! Home/away and season comparisons for one partner.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::aggregate;
use crate::event::{EventRecord, Venue};
use crate::format::{format_signed_percentage, format_value, ValueFormat};
use crate::formula::ratio_or_zero;
use crate::limits::SEASON_START_MONTH;
use crate::stats::is_averaged_field;

/// Season label such as `2024/25`; seasons start in August.
pub fn season_label(date: NaiveDate) -> String {
    let start = if date.month() >= SEASON_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}/{:02}", start, (start + 1).rem_euclid(100))
}

/// One side of the home/away split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideSummary {
    pub event_count: usize,
    /// Events on this side that carry the metric.
    pub sample_count: usize,
    pub total: f64,
    pub average: Option<f64>,
}

impl SideSummary {
    fn add(&mut self, value: Option<f64>) {
        self.event_count += 1;
        if let Some(v) = value {
            self.sample_count += 1;
            self.total += v;
        }
    }

    fn finish(mut self) -> Self {
        self.average = (self.sample_count > 0).then(|| self.total / self.sample_count as f64);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeAwayComparison {
    pub partner_id: String,
    pub metric: String,
    pub home: SideSummary,
    pub away: SideSummary,
    /// (home - away) / away, as a fraction.
    pub advantage: Option<f64>,
    pub summary: String,
}

/// Compare a partner's home and away averages for `metric`.
pub fn compare_home_away(
    partner_id: &str,
    events: &[EventRecord],
    metric: &str,
) -> HomeAwayComparison {
    let mut home = SideSummary::default();
    let mut away = SideSummary::default();
    for event in events {
        match event.venue_for(partner_id) {
            Some(Venue::Home) => home.add(event.stats.get(metric)),
            Some(Venue::Away) => away.add(event.stats.get(metric)),
            None => {}
        }
    }
    let home = home.finish();
    let away = away.finish();

    let (advantage, summary) = match (home.average, away.average) {
        (Some(h), Some(a)) => {
            let advantage = ratio_or_zero(h - a, a);
            let summary = format!(
                "Home events average {} {} vs {} away ({} home advantage)",
                format_value(h, ValueFormat::Count),
                metric,
                format_value(a, ValueFormat::Count),
                format_signed_percentage(advantage)
            );
            (Some(advantage), summary)
        }
        _ => (
            None,
            format!("Not enough home and away events with {} to compare", metric),
        ),
    };

    HomeAwayComparison {
        partner_id: partner_id.to_string(),
        metric: metric.to_string(),
        home,
        away,
        advantage,
        summary,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonBucket {
    pub season: String,
    pub event_count: usize,
    /// Events in the season that carry the metric.
    pub sample_count: usize,
    /// Aggregated value: a sum, or the mean for averaged fields.
    pub total: Option<f64>,
    /// Mean over the events that carry the metric.
    pub average: Option<f64>,
    pub date_range: String,
}

/// Per-season totals and per-event averages of `metric`, oldest season first.
pub fn season_breakdown(events: &[EventRecord], metric: &str) -> Vec<SeasonBucket> {
    let mut seasons: BTreeMap<String, Vec<&EventRecord>> = BTreeMap::new();
    for event in events {
        seasons.entry(season_label(event.date)).or_default().push(event);
    }

    seasons
        .into_iter()
        .filter_map(|(season, members)| {
            let mut side = SideSummary::default();
            for event in &members {
                side.add(event.stats.get(metric));
            }
            let side = side.finish();

            let agg = aggregate(members)?;
            let total = if is_averaged_field(metric) {
                side.average
            } else {
                agg.stats.get(metric)
            };
            Some(SeasonBucket {
                season,
                event_count: agg.event_count,
                sample_count: side.sample_count,
                total,
                average: side.average,
                date_range: agg.date_range.label,
            })
        })
        .collect()
}

/// Both comparisons for a partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerComparison {
    pub home_away: HomeAwayComparison,
    pub seasons: Vec<SeasonBucket>,
}

pub fn compare_partner(
    partner_id: &str,
    events: &[EventRecord],
    metric: &str,
) -> PartnerComparison {
    let own: Vec<EventRecord> = events
        .iter()
        .filter(|e| e.involves(partner_id))
        .cloned()
        .collect();
    PartnerComparison {
        home_away: compare_home_away(partner_id, &own, metric),
        seasons: season_breakdown(&own, metric),
    }
}
