//! Rule-based insights about an event against its partner's history.
//!
//! Every rule is independent. A rule that fails is logged and skipped; in a
//! batch, an event that cannot be evaluated is logged and skipped. Results are
//! ordered by priority rank descending, then confidence descending, and keep
//! rule order on exact ties.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::event::EventRecord;
use crate::format::{format_signed_percentage, format_value, round_to, ValueFormat};
use crate::formula::ratio_or_zero;
use crate::limits::MAX_INSIGHT_HISTORY;

/// Fewest history samples a trend rule needs.
pub const MIN_BASELINE_SAMPLES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// critical=4 … low=1
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    AttendanceTrend,
    EngagementShift,
    MerchandisePenetration,
    ImageRejection,
    RecordAttendance,
    YouthShare,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttendanceTrend => "attendance_trend",
            Self::EngagementShift => "engagement_shift",
            Self::MerchandisePenetration => "merchandise_penetration",
            Self::ImageRejection => "image_rejection",
            Self::RecordAttendance => "record_attendance",
            Self::YouthShare => "youth_share",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub event_id: String,
    pub kind: InsightKind,
    pub priority: Priority,
    /// 0..=1
    pub confidence: f64,
    pub title: String,
    pub message: String,
    pub metric: String,
    pub current_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_value: Option<f64>,
    /// Relative change against the baseline, as a fraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
}

/// The event under evaluation and its preceding same-partner events.
#[derive(Debug, Clone)]
pub struct InsightContext<'a> {
    pub current: &'a EventRecord,
    /// Newest first, at most `MAX_INSIGHT_HISTORY`.
    pub history: Vec<&'a EventRecord>,
}

impl<'a> InsightContext<'a> {
    /// Keep only earlier events of the current event's partner.
    pub fn new(current: &'a EventRecord, candidates: &'a [EventRecord]) -> Self {
        let mut history: Vec<&EventRecord> = match current.partner_id.as_deref() {
            Some(partner) => candidates
                .iter()
                .filter(|e| e.id != current.id && e.date < current.date && e.involves(partner))
                .collect(),
            None => Vec::new(),
        };
        history.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        history.truncate(MAX_INSIGHT_HISTORY);
        Self { current, history }
    }

    fn insight(&self, kind: InsightKind, finding: Finding) -> Insight {
        let change = finding
            .baseline_value
            .map(|b| ratio_or_zero(finding.current_value - b, b));
        Insight {
            id: format!("{}:{}", self.current.id, kind.as_str()),
            event_id: self.current.id.clone(),
            kind,
            priority: finding.priority,
            confidence: round_to(finding.confidence.clamp(0.0, 1.0), 2),
            title: finding.title,
            message: finding.message,
            metric: finding.metric.to_string(),
            current_value: finding.current_value,
            baseline_value: finding.baseline_value,
            change,
        }
    }
}

/// What a rule found, before it is tied to the evaluated event.
#[derive(Debug, Clone)]
pub struct Finding {
    pub priority: Priority,
    /// 0..=1, clamped when the insight is built.
    pub confidence: f64,
    pub title: String,
    pub message: String,
    pub metric: &'static str,
    pub current_value: f64,
    pub baseline_value: Option<f64>,
}

/// Confidence grows with the amount of history.
pub fn history_confidence(samples: usize) -> f64 {
    (0.5 + 0.05 * samples as f64).min(0.95)
}

/// A single threshold or trend check.
pub trait InsightRule: Send + Sync {
    fn kind(&self) -> InsightKind;

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Result<Option<Insight>>;
}

/// Field value, rejecting corrupt numbers.
fn metric(event: &EventRecord, field: &str) -> Result<Option<f64>> {
    match event.stats.get(field) {
        Some(v) if !v.is_finite() => Err(Error::internal(format!(
            "event {} has non-finite {}",
            event.id, field
        ))),
        other => Ok(other),
    }
}

/// `num / den` per event, absent when either side is.
fn event_rate(event: &EventRecord, num: &str, den: &str) -> Result<Option<f64>> {
    match (metric(event, num)?, metric(event, den)?) {
        (Some(n), Some(d)) => Ok(Some(ratio_or_zero(n, d))),
        _ => Ok(None),
    }
}

/// Mean of a per-event reading over the history, if enough samples exist.
fn baseline<F>(history: &[&EventRecord], read: F) -> Result<Option<(f64, usize)>>
where
    F: Fn(&EventRecord) -> Result<Option<f64>>,
{
    let mut values = Vec::with_capacity(history.len());
    for event in history.iter().copied() {
        if let Some(v) = read(event)? {
            values.push(v);
        }
    }
    if values.len() < MIN_BASELINE_SAMPLES {
        return Ok(None);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Ok(Some((mean, values.len())))
}

/// Total fans against the trailing average.
pub struct AttendanceTrendRule {
    pub critical_drop: f64,
    pub high_drop: f64,
    pub growth: f64,
}

impl Default for AttendanceTrendRule {
    fn default() -> Self {
        Self {
            critical_drop: 0.40,
            high_drop: 0.20,
            growth: 0.20,
        }
    }
}

impl InsightRule for AttendanceTrendRule {
    fn kind(&self) -> InsightKind {
        InsightKind::AttendanceTrend
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Result<Option<Insight>> {
        let Some(current) = metric(ctx.current, "totalFans")? else {
            return Ok(None);
        };
        let Some((base, samples)) = baseline(&ctx.history, |e| metric(e, "totalFans"))? else {
            return Ok(None);
        };
        if base == 0.0 {
            return Ok(None);
        }

        let change = (current - base) / base;
        let (priority, title) = if change <= -self.critical_drop {
            (Priority::Critical, "Fan attendance collapsed")
        } else if change <= -self.high_drop {
            (Priority::High, "Fan attendance dropped")
        } else if change >= self.growth {
            (Priority::Low, "Fan attendance grew")
        } else {
            return Ok(None);
        };

        let message = format!(
            "{} fans vs a trailing average of {} over {} events ({})",
            format_value(current, ValueFormat::Count),
            format_value(base, ValueFormat::Count),
            samples,
            format_signed_percentage(change)
        );
        Ok(Some(ctx.insight(
            self.kind(),
            Finding {
                priority,
                confidence: history_confidence(samples),
                title: title.into(),
                message,
                metric: "totalFans",
                current_value: current,
                baseline_value: Some(base),
            },
        )))
    }
}

/// Fans per attendee against the trailing rate.
pub struct EngagementShiftRule {
    pub high_drop: f64,
    pub medium_drop: f64,
}

impl Default for EngagementShiftRule {
    fn default() -> Self {
        Self {
            high_drop: 0.30,
            medium_drop: 0.15,
        }
    }
}

impl InsightRule for EngagementShiftRule {
    fn kind(&self) -> InsightKind {
        InsightKind::EngagementShift
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Result<Option<Insight>> {
        let read = |e: &EventRecord| event_rate(e, "totalFans", "eventAttendees");
        let Some(current) = read(ctx.current)? else {
            return Ok(None);
        };
        let Some((base, samples)) = baseline(&ctx.history, read)? else {
            return Ok(None);
        };
        if base == 0.0 {
            return Ok(None);
        }

        let change = (current - base) / base;
        let priority = if change <= -self.high_drop {
            Priority::High
        } else if change <= -self.medium_drop {
            Priority::Medium
        } else {
            return Ok(None);
        };

        let message = format!(
            "{} of attendees engaged vs {} on average ({})",
            format_value(current, ValueFormat::Percentage),
            format_value(base, ValueFormat::Percentage),
            format_signed_percentage(change)
        );
        Ok(Some(ctx.insight(
            self.kind(),
            Finding {
                priority,
                confidence: history_confidence(samples),
                title: "Engagement rate dropped".into(),
                message,
                metric: "engagementRate",
                current_value: current,
                baseline_value: Some(base),
            },
        )))
    }
}

/// Merchandised fans per fan against the trailing rate.
pub struct MerchandisePenetrationRule {
    pub threshold: f64,
}

impl Default for MerchandisePenetrationRule {
    fn default() -> Self {
        Self { threshold: 0.25 }
    }
}

impl InsightRule for MerchandisePenetrationRule {
    fn kind(&self) -> InsightKind {
        InsightKind::MerchandisePenetration
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Result<Option<Insight>> {
        let read = |e: &EventRecord| event_rate(e, "merched", "totalFans");
        let Some(current) = read(ctx.current)? else {
            return Ok(None);
        };
        let Some((base, samples)) = baseline(&ctx.history, read)? else {
            return Ok(None);
        };
        if base == 0.0 {
            return Ok(None);
        }

        let change = (current - base) / base;
        let (priority, title) = if change <= -self.threshold {
            (Priority::Medium, "Merchandise penetration fell")
        } else if change >= self.threshold {
            (Priority::Low, "Merchandise penetration rose")
        } else {
            return Ok(None);
        };

        let message = format!(
            "{} of fans wore merchandise vs {} on average ({})",
            format_value(current, ValueFormat::Percentage),
            format_value(base, ValueFormat::Percentage),
            format_signed_percentage(change)
        );
        Ok(Some(ctx.insight(
            self.kind(),
            Finding {
                priority,
                confidence: history_confidence(samples),
                title: title.into(),
                message,
                metric: "merchandisePenetration",
                current_value: current,
                baseline_value: Some(base),
            },
        )))
    }
}

/// Share of rejected images, no history needed.
pub struct ImageRejectionRule {
    pub high: f64,
    pub medium: f64,
    pub min_images: f64,
}

impl Default for ImageRejectionRule {
    fn default() -> Self {
        Self {
            high: 0.50,
            medium: 0.30,
            min_images: 10.0,
        }
    }
}

impl InsightRule for ImageRejectionRule {
    fn kind(&self) -> InsightKind {
        InsightKind::ImageRejection
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Result<Option<Insight>> {
        let (Some(approved), Some(rejected)) = (
            metric(ctx.current, "approvedImages")?,
            metric(ctx.current, "rejectedImages")?,
        ) else {
            return Ok(None);
        };
        let reviewed = approved + rejected;
        if reviewed < self.min_images {
            return Ok(None);
        }

        let share = ratio_or_zero(rejected, reviewed);
        let priority = if share > self.high {
            Priority::High
        } else if share > self.medium {
            Priority::Medium
        } else {
            return Ok(None);
        };

        let message = format!(
            "{} of {} reviewed images were rejected",
            format_value(share, ValueFormat::Percentage),
            format_value(reviewed, ValueFormat::Count)
        );
        Ok(Some(ctx.insight(
            self.kind(),
            Finding {
                priority,
                confidence: 0.8,
                title: "High image rejection rate".into(),
                message,
                metric: "imageRejectionRate",
                current_value: share,
                baseline_value: None,
            },
        )))
    }
}

/// Attendance above every preceding event.
pub struct RecordAttendanceRule {
    pub min_history: usize,
}

impl Default for RecordAttendanceRule {
    fn default() -> Self {
        Self { min_history: 3 }
    }
}

impl InsightRule for RecordAttendanceRule {
    fn kind(&self) -> InsightKind {
        InsightKind::RecordAttendance
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Result<Option<Insight>> {
        let Some(current) = metric(ctx.current, "totalFans")? else {
            return Ok(None);
        };
        let mut previous = Vec::with_capacity(ctx.history.len());
        for event in &ctx.history {
            if let Some(v) = metric(event, "totalFans")? {
                previous.push(v);
            }
        }
        if previous.len() < self.min_history {
            return Ok(None);
        }

        let best = previous.iter().copied().fold(f64::MIN, f64::max);
        if current <= best {
            return Ok(None);
        }

        let message = format!(
            "{} fans beats the previous best of {} across the last {} events",
            format_value(current, ValueFormat::Count),
            format_value(best, ValueFormat::Count),
            previous.len()
        );
        Ok(Some(ctx.insight(
            self.kind(),
            Finding {
                priority: Priority::Low,
                confidence: history_confidence(previous.len()),
                title: "Record attendance".into(),
                message,
                metric: "totalFans",
                current_value: current,
                baseline_value: Some(best),
            },
        )))
    }
}

/// Under-40 share moving by more than `shift` (absolute).
pub struct YouthShareRule {
    pub shift: f64,
}

impl Default for YouthShareRule {
    fn default() -> Self {
        Self { shift: 0.10 }
    }
}

fn youth_share(event: &EventRecord) -> Result<Option<f64>> {
    match (metric(event, "totalUnder40")?, metric(event, "totalOver40")?) {
        (Some(young), Some(old)) => Ok(Some(ratio_or_zero(young, young + old))),
        _ => Ok(None),
    }
}

impl InsightRule for YouthShareRule {
    fn kind(&self) -> InsightKind {
        InsightKind::YouthShare
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Result<Option<Insight>> {
        let Some(current) = youth_share(ctx.current)? else {
            return Ok(None);
        };
        let Some((base, samples)) = baseline(&ctx.history, youth_share)? else {
            return Ok(None);
        };

        let delta = current - base;
        if delta.abs() < self.shift {
            return Ok(None);
        }

        let direction = if delta > 0.0 { "younger" } else { "older" };
        let message = format!(
            "Audience skewed {}: {} under 40 vs {} on average",
            direction,
            format_value(current, ValueFormat::Percentage),
            format_value(base, ValueFormat::Percentage)
        );
        Ok(Some(ctx.insight(
            self.kind(),
            Finding {
                priority: Priority::Low,
                confidence: history_confidence(samples),
                title: "Audience age shift".into(),
                message,
                metric: "youthShare",
                current_value: current,
                baseline_value: Some(base),
            },
        )))
    }
}

/// The fixed rule set, in evaluation order.
pub fn default_rules() -> Vec<Box<dyn InsightRule>> {
    vec![
        Box::new(AttendanceTrendRule::default()),
        Box::new(EngagementShiftRule::default()),
        Box::new(MerchandisePenetrationRule::default()),
        Box::new(ImageRejectionRule::default()),
        Box::new(RecordAttendanceRule::default()),
        Box::new(YouthShareRule::default()),
    ]
}

/// Priority rank descending, then confidence descending. Stable.
pub fn sort_insights(insights: &mut [Insight]) {
    insights.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
}

/// Insights plus what had to be skipped to produce them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    pub failed_rules: usize,
    pub skipped_events: Vec<String>,
}

/// Run every rule for one event, skipping rules that fail.
///
/// Fails only when the current event itself is unusable.
pub fn evaluate_event(
    current: &EventRecord,
    history: &[EventRecord],
    rules: &[Box<dyn InsightRule>],
) -> Result<InsightReport> {
    current.stats.validate()?;

    let ctx = InsightContext::new(current, history);
    let mut report = InsightReport::default();
    for rule in rules {
        match rule.evaluate(&ctx) {
            Ok(Some(insight)) => report.insights.push(insight),
            Ok(None) => {}
            Err(e) => {
                warn!(
                    event_id = %current.id,
                    rule = rule.kind().as_str(),
                    error = %e,
                    "Insight rule failed, skipping"
                );
                report.failed_rules += 1;
            }
        }
    }
    sort_insights(&mut report.insights);
    Ok(report)
}

/// Evaluate several events, each with its own history.
pub fn evaluate_batch(
    items: &[(EventRecord, Vec<EventRecord>)],
    rules: &[Box<dyn InsightRule>],
) -> InsightReport {
    let mut report = InsightReport::default();
    for (current, history) in items {
        match evaluate_event(current, history, rules) {
            Ok(event_report) => {
                report.insights.extend(event_report.insights);
                report.failed_rules += event_report.failed_rules;
            }
            Err(e) => {
                warn!(event_id = %current.id, error = %e, "Skipping event in insight batch");
                report.skipped_events.push(current.id.clone());
            }
        }
    }
    sort_insights(&mut report.insights);
    report
}
