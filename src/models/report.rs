use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RealizeError;

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// The dimension a report is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Breakdown {
    Day,
    Week,
    Month,
    HourOfDay,
    Campaign,
    Site,
    Country,
    Platform,
    Item,
}

impl Breakdown {
    /// Every breakdown the report endpoints accept, in menu order.
    pub const ALL: [Breakdown; 9] = [
        Breakdown::Day,
        Breakdown::Week,
        Breakdown::Month,
        Breakdown::Campaign,
        Breakdown::Item,
        Breakdown::Site,
        Breakdown::Country,
        Breakdown::Platform,
        Breakdown::HourOfDay,
    ];

    /// The wire name embedded in report request paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Breakdown::Day => "day",
            Breakdown::Week => "week",
            Breakdown::Month => "month",
            Breakdown::HourOfDay => "by_hour_of_day",
            Breakdown::Campaign => "campaign_breakdown",
            Breakdown::Site => "site_breakdown",
            Breakdown::Country => "country_breakdown",
            Breakdown::Platform => "platform_breakdown",
            Breakdown::Item => "item_breakdown",
        }
    }

    /// The row field carrying this breakdown's dimension value: the wire
    /// name with any `_breakdown` suffix stripped.
    pub fn dimension_key(self) -> &'static str {
        match self {
            Breakdown::Day | Breakdown::Week | Breakdown::Month => "date",
            Breakdown::HourOfDay => "by_hour_of_day",
            Breakdown::Campaign => "campaign",
            Breakdown::Site => "site",
            Breakdown::Country => "country",
            Breakdown::Platform => "platform",
            Breakdown::Item => "item",
        }
    }

    /// Human caption for headers and summaries.
    pub fn pretty(self) -> &'static str {
        match self {
            Breakdown::Day => "Day",
            Breakdown::Week => "Week",
            Breakdown::Month => "Month",
            Breakdown::HourOfDay => "Hour of Day",
            Breakdown::Campaign => "Campaign",
            Breakdown::Site => "Site",
            Breakdown::Country => "Country",
            Breakdown::Platform => "Platform",
            Breakdown::Item => "Ad",
        }
    }

    /// `reportId` value the Realize GUI expects for this breakdown.
    pub fn gui_report_id(self) -> &'static str {
        match self {
            Breakdown::Day => "day",
            Breakdown::Week => "week",
            Breakdown::Month => "month",
            Breakdown::HourOfDay => "hour-of-day",
            Breakdown::Campaign => "campaigns",
            Breakdown::Site => "sites",
            Breakdown::Country => "country",
            Breakdown::Platform => "platform",
            Breakdown::Item => "creative",
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, Breakdown::Day | Breakdown::Week | Breakdown::Month)
    }

    /// Whether the "active rows with spend" aggregate is meaningful.
    pub fn counts_active(self) -> bool {
        matches!(self, Breakdown::Campaign | Breakdown::Site | Breakdown::Item)
    }
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Breakdown {
    type Err = RealizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Breakdown::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| RealizeError::InvalidArgument(format!("unknown breakdown: {s}")))
    }
}

// ---------------------------------------------------------------------------
// MetricValue
// ---------------------------------------------------------------------------

/// A dynamic-metric cell: the API emits numbers for counts and sometimes
/// pre-formatted strings for currency metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn from_json(value: &Value) -> Option<MetricValue> {
        match value {
            Value::Number(n) => n.as_f64().map(MetricValue::Number),
            Value::String(s) => Some(MetricValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric value, parsing plain numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Numeric value after stripping anything that is not a digit, dot or
    /// minus sign; tolerates pre-formatted currency strings like "$1,204".
    pub fn as_f64_relaxed(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                cleaned.parse().ok()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ReportRow
// ---------------------------------------------------------------------------

/// The breakdown-specific identity of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowDims {
    /// day / week / month rows.
    Date { date: Option<String> },
    Campaign {
        id: Option<String>,
        name: Option<String>,
    },
    Item {
        id: Option<String>,
        name: Option<String>,
        url: Option<String>,
        thumbnail_url: Option<String>,
    },
    /// site / country / platform / hour-of-day rows.
    Dimension { value: Option<String> },
}

/// One normalized report row: the common base (spend + dynamic metrics)
/// plus the tagged per-breakdown dimension.
///
/// `extra` keeps the remaining top-level fields of the raw row so metric
/// lookups can fall back from `dynamic_metrics` to flat fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub spent: f64,
    pub currency: Option<String>,
    pub dynamic_metrics: BTreeMap<String, MetricValue>,
    pub dims: RowDims,
    pub extra: Map<String, Value>,
}

impl ReportRow {
    /// Normalize a raw result row for the given breakdown.
    ///
    /// Returns `None` when the row fails shape validation (no numeric
    /// `spent`); such rows are dropped by the fetcher, not errored.
    pub fn from_raw(mut raw: Map<String, Value>, breakdown: Breakdown) -> Option<ReportRow> {
        let spent = raw.get("spent").and_then(Value::as_f64)?;
        let currency = raw
            .get("currency")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let mut dynamic_metrics = BTreeMap::new();
        if let Some(Value::Array(fields)) = raw.remove("dynamic_fields") {
            for field in &fields {
                let (Some(id), Some(value)) = (
                    field.get("id").and_then(Value::as_str),
                    field.get("value"),
                ) else {
                    continue;
                };
                if let Some(metric) = MetricValue::from_json(value) {
                    dynamic_metrics.insert(id.to_owned(), metric);
                }
            }
        }

        let dims = match breakdown {
            Breakdown::Day | Breakdown::Week | Breakdown::Month => RowDims::Date {
                date: field_string(&raw, "date"),
            },
            Breakdown::Campaign => RowDims::Campaign {
                id: field_string(&raw, "campaign"),
                name: field_string(&raw, "campaign_name"),
            },
            Breakdown::Item => RowDims::Item {
                id: field_string(&raw, "item"),
                name: field_string(&raw, "item_name"),
                url: field_string(&raw, "url"),
                thumbnail_url: field_string(&raw, "thumbnail_url"),
            },
            _ => RowDims::Dimension {
                value: field_string(&raw, breakdown.dimension_key()),
            },
        };

        Some(ReportRow {
            spent,
            currency,
            dynamic_metrics,
            dims,
            extra: raw,
        })
    }

    /// Metric lookup chain: `dynamic_metrics[id]` first, then the row's own
    /// top-level field of the same key. Absence stays absent, never zero.
    pub fn metric(&self, id: &str) -> Option<MetricValue> {
        if let Some(value) = self.dynamic_metrics.get(id) {
            return Some(value.clone());
        }
        self.extra.get(id).and_then(MetricValue::from_json)
    }

    pub fn metric_f64(&self, id: &str) -> Option<f64> {
        self.metric(id).and_then(|v| v.as_f64())
    }

    /// A top-level field as a plain number, for flat-field fallbacks.
    pub fn flat_f64(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(Value::as_f64)
    }
}

fn field_string(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// DynamicFieldCaptions
// ---------------------------------------------------------------------------

/// Metric-id → caption lookup for one fetch, preserving the API's field
/// order: reconciliation is first-match over this order, so a hash map
/// would change results.
#[derive(Debug, Clone, Default)]
pub struct DynamicFieldCaptions(Vec<(String, String)>);

impl DynamicFieldCaptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: String, caption: String) {
        self.0.push((id, caption));
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(i, _)| i == id)
            .map(|(_, c)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(i, c)| (i.as_str(), c.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, String)> for DynamicFieldCaptions {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        DynamicFieldCaptions(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Fetch artifacts
// ---------------------------------------------------------------------------

/// Output of one report fetch, consumed by the reconciler and projector.
#[derive(Debug, Clone, Default)]
pub struct ReportResult {
    pub rows: Vec<ReportRow>,
    pub dynamic_field_captions: DynamicFieldCaptions,
    /// Set when the row count exceeded the processing ceiling and the tail
    /// was dropped. A warning, not an error.
    pub truncated: bool,
    /// Rows dropped during normalization for failing shape validation.
    pub dropped_rows: usize,
}

/// One fixed-size page of the streamed site breakdown.
#[derive(Debug, Clone)]
pub struct SitePage {
    pub page: usize,
    pub rows: Vec<ReportRow>,
    /// Whether the underlying stream was cut at the row cap (more data was
    /// available upstream than the pager will ever serve).
    pub capped: bool,
}

/// One row of the network sub-account ("content provider") breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAccountSpendRow {
    pub content_provider: String,
    #[serde(deserialize_with = "super::string_or_number")]
    pub content_provider_id: String,
    pub spent: f64,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Self-describing schema entry for a dynamic metric column.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamicFieldMeta {
    pub id: String,
    pub caption: String,
    pub format: Option<String>,
    pub data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportApiMetadata {
    pub dynamic_fields: Option<Vec<DynamicFieldMeta>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportApiResponse {
    #[serde(default)]
    pub results: Vec<Map<String, Value>>,
    pub metadata: Option<ReportApiMetadata>,
}
