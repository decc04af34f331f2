//! Row/table projection: one column schema and one set of cell values per
//! report, shared verbatim by the markdown renderer and the spreadsheet
//! writer so both always show identical numbers.

use std::collections::BTreeMap;

use crate::models::{Breakdown, ReportRow, RowDims};
use crate::reconcile::ResolvedMetric;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub header: String,
    /// Numeric columns are right-aligned by renderers.
    pub numeric: bool,
}

impl Column {
    fn text(key: &str, header: &str) -> Self {
        Column {
            key: key.to_owned(),
            header: header.to_owned(),
            numeric: false,
        }
    }

    fn number(key: &str, header: &str) -> Self {
        Column {
            key: key.to_owned(),
            header: header.to_owned(),
            numeric: true,
        }
    }
}

/// Projection flags and resolved metrics for one report.
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    pub clicks_metric_id: Option<String>,
    pub impressions_metric_id: Option<String>,
    pub include_clicks: bool,
    pub include_ctr: bool,
    pub include_url: bool,
    pub include_thumbnail: bool,
    pub conversions: Option<ResolvedMetric>,
    pub cpa: Option<ResolvedMetric>,
    pub cpa_goal: Option<f64>,
}

impl ProjectOptions {
    fn wants_clicks(&self) -> bool {
        self.include_clicks || self.clicks_metric_id.is_some()
    }

    fn wants_ctr(&self) -> bool {
        self.include_ctr
            || (self.clicks_metric_id.is_some() && self.impressions_metric_id.is_some())
    }

    fn clicks_key(&self) -> &str {
        self.clicks_metric_id.as_deref().unwrap_or("clicks")
    }
}

/// The column schema for a breakdown plus options. Fixed base columns per
/// breakdown; clicks/CTR/url/thumbnail and the two conversion columns are
/// appended per flags and resolved metrics.
pub fn column_schema(breakdown: Breakdown, opts: &ProjectOptions) -> Vec<Column> {
    let mut columns = Vec::new();

    match breakdown {
        Breakdown::Item => {
            columns.push(Column::text("item", "Item ID"));
            columns.push(Column::text("item_name", "Item Name"));
            columns.push(Column::number("spent", "Spent"));
        }
        Breakdown::Campaign => {
            columns.push(Column::text("campaign", "Campaign ID"));
            columns.push(Column::text("campaign_name", "Campaign Name"));
            columns.push(Column::number("spent", "Spent"));
        }
        Breakdown::Day | Breakdown::Week | Breakdown::Month => {
            columns.push(Column::text("date", "Date"));
            columns.push(Column::number("spent", "Spent"));
        }
        other => {
            columns.push(Column::text(other.dimension_key(), other.pretty()));
            columns.push(Column::number("spent", "Spent"));
        }
    }

    if opts.wants_clicks() {
        columns.push(Column::number("clicks", "Clicks"));
    }
    if opts.wants_ctr() {
        columns.push(Column::number("ctr", "CTR"));
    }
    if breakdown == Breakdown::Item {
        if opts.include_url {
            columns.push(Column::text("url", "URL"));
        }
        if opts.include_thumbnail {
            columns.push(Column::text("thumbnail_url", "Thumbnail"));
        }
    }

    if let Some(conversions) = &opts.conversions {
        columns.push(Column::number("conversions", &conversions.caption));
    }
    if let Some(cpa) = &opts.cpa {
        columns.push(Column::number("cpa", &cpa.caption));
    }

    columns
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// One projected cell. `Empty` means "not reported" and is distinct from
/// zero, which is a legitimate value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn text_or_empty(value: Option<&str>) -> Cell {
        match value {
            Some(s) => Cell::Text(s.to_owned()),
            None => Cell::Empty,
        }
    }

    fn number_or_empty(value: Option<f64>) -> Cell {
        match value {
            Some(n) => Cell::Number(n),
            None => Cell::Empty,
        }
    }
}

/// CPA-vs-goal verdict for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpaFlag {
    #[default]
    None,
    /// Strictly under the goal.
    Good,
    /// More than 1.5x the goal.
    Bad,
}

#[derive(Debug, Clone)]
pub struct ProjectedRow {
    pub cells: BTreeMap<String, Cell>,
    pub cpa_flag: CpaFlag,
}

impl ProjectedRow {
    pub fn cell(&self, key: &str) -> &Cell {
        self.cells.get(key).unwrap_or(&Cell::Empty)
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project one row against the schema for its breakdown.
pub fn project_row(row: &ReportRow, breakdown: Breakdown, opts: &ProjectOptions) -> ProjectedRow {
    let mut cells = BTreeMap::new();

    match &row.dims {
        RowDims::Date { date } => {
            // The API appends a time component; the date column shows only
            // the calendar date.
            let day = date
                .as_deref()
                .and_then(|d| d.split_whitespace().next())
                .map(str::to_owned);
            cells.insert("date".to_owned(), Cell::text_or_empty(day.as_deref()));
        }
        RowDims::Campaign { id, name } => {
            cells.insert("campaign".to_owned(), Cell::text_or_empty(id.as_deref()));
            cells.insert(
                "campaign_name".to_owned(),
                Cell::text_or_empty(name.as_deref()),
            );
        }
        RowDims::Item {
            id,
            name,
            url,
            thumbnail_url,
        } => {
            cells.insert("item".to_owned(), Cell::text_or_empty(id.as_deref()));
            cells.insert("item_name".to_owned(), Cell::text_or_empty(name.as_deref()));
            if opts.include_url {
                cells.insert("url".to_owned(), Cell::text_or_empty(url.as_deref()));
            }
            if opts.include_thumbnail {
                cells.insert(
                    "thumbnail_url".to_owned(),
                    Cell::text_or_empty(thumbnail_url.as_deref()),
                );
            }
        }
        RowDims::Dimension { value } => {
            cells.insert(
                breakdown.dimension_key().to_owned(),
                Cell::text_or_empty(value.as_deref()),
            );
        }
    }

    cells.insert("spent".to_owned(), Cell::Number(row.spent));

    let clicks = if opts.wants_clicks() {
        let value = row.metric_f64(opts.clicks_key());
        cells.insert("clicks".to_owned(), Cell::number_or_empty(value));
        value
    } else {
        None
    };

    if opts.wants_ctr() {
        let impressions = opts
            .impressions_metric_id
            .as_deref()
            .and_then(|id| row.metric_f64(id));
        let ctr = match (clicks, impressions) {
            (Some(c), Some(i)) if i > 0.0 => Some(c / i),
            _ => None,
        };
        cells.insert("ctr".to_owned(), Cell::number_or_empty(ctr));
    }

    let mut conversion_count = None;
    if let Some(conversions) = &opts.conversions {
        conversion_count = row.metric(&conversions.id).and_then(|v| v.as_f64());
        cells.insert(
            "conversions".to_owned(),
            Cell::number_or_empty(conversion_count),
        );
    }

    let mut cpa_flag = CpaFlag::None;
    if let Some(cpa) = &opts.cpa {
        let cpa_value = row.metric(&cpa.id).and_then(|v| v.as_f64_relaxed());
        cells.insert("cpa".to_owned(), Cell::number_or_empty(cpa_value));

        // Only rows with actual conversions get judged against the goal.
        if let (Some(count), Some(goal), Some(value)) =
            (conversion_count, opts.cpa_goal, cpa_value)
        {
            if count > 0.0 && goal.is_finite() {
                if value < goal {
                    cpa_flag = CpaFlag::Good;
                } else if value > goal * 1.5 {
                    cpa_flag = CpaFlag::Bad;
                }
            }
        }
    }

    ProjectedRow { cells, cpa_flag }
}

pub fn project_rows(
    rows: &[ReportRow],
    breakdown: Breakdown,
    opts: &ProjectOptions,
) -> Vec<ProjectedRow> {
    rows.iter()
        .map(|row| project_row(row, breakdown, opts))
        .collect()
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub spent: f64,
    pub conversions: f64,
    /// Rows with spend over zero. Only meaningful for campaign, site and
    /// item breakdowns; `None` elsewhere.
    pub active_rows: Option<usize>,
}

/// Aggregate over the full (untruncated-by-display) row set. Unresolvable
/// conversion values count as zero here, and only here; per-row display
/// keeps them empty.
pub fn totals(
    rows: &[ReportRow],
    breakdown: Breakdown,
    conversion_metric_id: Option<&str>,
) -> Totals {
    let spent = rows.iter().map(|r| r.spent).sum();
    let conversions = match conversion_metric_id {
        Some(id) => rows.iter().filter_map(|r| r.metric_f64(id)).sum(),
        None => 0.0,
    };
    let active_rows = breakdown
        .counts_active()
        .then(|| rows.iter().filter(|r| r.spent > 0.0).count());

    Totals {
        spent,
        conversions,
        active_rows,
    }
}
