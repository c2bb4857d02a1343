//! Chart configurations and the chart calculator.
//!
//! A `ChartConfiguration` is what gets stored and edited. Compiling it checks
//! the element count for its type and parses every formula, producing a
//! `ChartDefinition` that can be evaluated any number of times.

use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

use crate::error::{Error, Result};
use crate::format::{display_value, format_value, ValueFormat};
use crate::formula::{Evaluated, Formula};
use crate::stats::StatRecord;

/// Chart kinds and their fixed element counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Pie,
    Bar,
    Kpi,
    Text,
    Image,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pie => "pie",
            Self::Bar => "bar",
            Self::Kpi => "kpi",
            Self::Text => "text",
            Self::Image => "image",
        }
    }

    /// Exact number of elements a chart of this type carries.
    pub fn required_elements(&self) -> usize {
        match self {
            Self::Pie => 2,
            Self::Bar => 5,
            Self::Kpi | Self::Text | Self::Image => 1,
        }
    }

    /// Types that are hidden when none of their elements has data.
    pub fn needs_data(&self) -> bool {
        matches!(self, Self::Pie | Self::Bar | Self::Kpi)
    }

    fn has_total(&self) -> bool {
        matches!(self, Self::Pie | Self::Bar)
    }
}

fn default_true() -> bool {
    true
}

/// One element as stored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ElementConfig {
    #[validate(length(min = 1, max = 100))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    #[validate(length(min = 1, max = 500))]
    pub formula: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub color: String,
    /// Defaults to percentage for `PERCENT(..)` formulas, count otherwise.
    #[serde(default)]
    pub format: Option<ValueFormat>,
}

/// A chart as stored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfiguration {
    #[validate(length(min = 1, max = 100))]
    pub chart_id: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub subtitle: Option<String>,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub elements: Vec<ElementConfig>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ChartConfiguration {
    /// Validate and parse into an evaluable definition.
    pub fn compile(&self) -> Result<ChartDefinition> {
        self.validate()
            .map_err(|e| Error::invalid_chart(format!("chart '{}': {}", self.chart_id, e)))?;

        let required = self.chart_type.required_elements();
        if self.elements.len() != required {
            return Err(Error::invalid_chart(format!(
                "{} chart '{}' needs exactly {} element(s), got {}",
                self.chart_type.as_str(),
                self.chart_id,
                required,
                self.elements.len()
            )));
        }

        let mut elements: Vec<ElementDefinition> = Vec::with_capacity(required);
        for element in &self.elements {
            element.validate().map_err(|e| {
                Error::invalid_chart(format!("element '{}': {}", element.id, e))
            })?;
            if elements.iter().any(|e| e.id == element.id) {
                return Err(Error::invalid_chart(format!(
                    "chart '{}' repeats element id '{}'",
                    self.chart_id, element.id
                )));
            }

            let formula = Formula::parse(&element.formula).map_err(|e| {
                Error::invalid_formula(format!("element '{}': {}", element.id, e.message()))
            })?;
            let format = element.format.unwrap_or(if formula.is_percentage() {
                ValueFormat::Percentage
            } else {
                ValueFormat::Count
            });

            elements.push(ElementDefinition {
                id: element.id.clone(),
                label: element.label.clone(),
                color: element.color.clone(),
                formula,
                format,
            });
        }

        Ok(ChartDefinition {
            chart_id: self.chart_id.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            chart_type: self.chart_type,
            order: self.order,
            elements,
        })
    }
}

/// Compiled element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDefinition {
    pub id: String,
    pub label: String,
    pub color: String,
    pub formula: Formula,
    pub format: ValueFormat,
}

/// Compiled chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDefinition {
    pub chart_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub chart_type: ChartType,
    pub order: i32,
    pub elements: Vec<ElementDefinition>,
}

impl ChartDefinition {
    /// Fields read by any element.
    pub fn fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for field in self.elements.iter().flat_map(|e| e.formula.fields()) {
            if !out.contains(&field) {
                out.push(field);
            }
        }
        out
    }
}

/// Outcome of compiling a batch of stored configurations.
#[derive(Debug, Default)]
pub struct CompiledCharts {
    /// Active charts ordered by display order, then id.
    pub charts: Vec<ChartDefinition>,
    /// Charts that failed to compile, with the reason.
    pub rejected: Vec<(String, Error)>,
}

/// Compile the active configurations, keeping the failures apart.
pub fn compile_active(configs: &[ChartConfiguration]) -> CompiledCharts {
    let mut compiled = CompiledCharts::default();
    for config in configs.iter().filter(|c| c.is_active) {
        match config.compile() {
            Ok(chart) => compiled.charts.push(chart),
            Err(e) => compiled.rejected.push((config.chart_id.clone(), e)),
        }
    }
    compiled
        .charts
        .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.chart_id.cmp(&b.chart_id)));
    compiled
}

/// Element value or the "not applicable" sentinel.
///
/// Serializes as a number or the string `"NA"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementValue {
    Number(f64),
    NotApplicable,
}

impl ElementValue {
    pub const SENTINEL: &'static str = "NA";

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

impl From<Evaluated> for ElementValue {
    fn from(evaluated: Evaluated) -> Self {
        match evaluated.value() {
            Some(v) => Self::Number(v),
            None => Self::NotApplicable,
        }
    }
}

impl Serialize for ElementValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Number(v) => serializer.serialize_f64(*v),
            Self::NotApplicable => serializer.serialize_str(Self::SENTINEL),
        }
    }
}

/// Calculated element.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementResult {
    pub id: String,
    pub label: String,
    pub color: String,
    pub format: ValueFormat,
    /// Unrounded value; percentages as fractions.
    pub raw_value: ElementValue,
    /// Rounded value; percentages in percent-space.
    pub value: ElementValue,
    pub formatted: String,
}

/// Calculated chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartCalculationResult {
    pub chart_id: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub elements: Vec<ElementResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// False when a pie/bar/kpi chart has no data at all.
    pub displayable: bool,
}

/// Evaluate one chart.
pub fn calculate_chart(chart: &ChartDefinition, stats: &StatRecord) -> ChartCalculationResult {
    let elements: Vec<ElementResult> = chart
        .elements
        .iter()
        .map(|element| {
            let raw_value = ElementValue::from(element.formula.evaluate(stats));
            let (value, formatted) = match raw_value {
                ElementValue::Number(v) => (
                    ElementValue::Number(display_value(v, element.format)),
                    format_value(v, element.format),
                ),
                ElementValue::NotApplicable => {
                    (ElementValue::NotApplicable, ElementValue::SENTINEL.to_string())
                }
            };
            ElementResult {
                id: element.id.clone(),
                label: element.label.clone(),
                color: element.color.clone(),
                format: element.format,
                raw_value,
                value,
                formatted,
            }
        })
        .collect();

    let any_data = elements.iter().any(|e| e.raw_value.is_applicable());
    let displayable = !chart.chart_type.needs_data() || any_data;

    let summable = chart.chart_type.has_total()
        && any_data
        && elements.iter().all(|e| e.format != ValueFormat::Percentage);
    let total = summable.then(|| {
        elements
            .iter()
            .filter_map(|e| e.raw_value.as_number())
            .sum::<f64>()
    });

    let subtitle = chart.subtitle.clone().or_else(|| {
        total.map(|t| {
            let format = chart.elements.first().map_or(ValueFormat::Count, |e| e.format);
            format!("Total: {}", format_value(t, format))
        })
    });

    ChartCalculationResult {
        chart_id: chart.chart_id.clone(),
        chart_type: chart.chart_type,
        title: chart.title.clone(),
        subtitle,
        elements,
        total,
        displayable,
    }
}

/// Evaluate every chart against one record, preserving chart order.
pub fn calculate_charts(
    charts: &[ChartDefinition],
    stats: &StatRecord,
) -> Vec<ChartCalculationResult> {
    charts.iter().map(|chart| calculate_chart(chart, stats)).collect()
}
