//! Markdown rendering of a projected report: table, totals, active-count
//! line and the Realize GUI deep link. Consumes the projector's columns
//! and cells verbatim, so the markdown and the spreadsheet export always
//! agree on the numbers.

use crate::config;
use crate::models::Breakdown;
use crate::project::{Cell, Column, CpaFlag, ProjectedRow, Totals};
use crate::reconcile::MetricResolution;

/// Rows shown in the markdown table. The full set still feeds the totals.
const DISPLAY_ROW_LIMIT: usize = 10;

const EMPTY_CELL: &str = "–";

#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    pub account_name: &'a str,
    /// Numeric account id, used only for the GUI link.
    pub account_id: i64,
    pub currency: &'a str,
    pub breakdown: Breakdown,
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub conversion_rule_name: Option<&'a str>,
    pub resolution: Option<&'a MetricResolution>,
    pub cpa_goal: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub markdown: String,
    pub gui_link: String,
}

pub fn build_markdown(
    config: &RenderConfig<'_>,
    columns: &[Column],
    rows: &[ProjectedRow],
    totals: &Totals,
) -> RenderedReport {
    let gui_link = gui_link(config);
    let mut md = String::new();

    md.push_str(&format!(
        "## {} Report for {}\n\n",
        config.breakdown.pretty(),
        config.account_name
    ));

    if let Some(rule_name) = config.conversion_rule_name {
        md.push_str(&format!("**Using Conversion Rule:** {}\n", escape(rule_name)));
        if let Some(goal) = config.cpa_goal.filter(|g| g.is_finite()) {
            md.push_str(&format!(
                "**CPA Goal:** {}\n",
                fmt_currency(config.currency, goal)
            ));
        }
        if let Some(resolution) = config.resolution {
            match (&resolution.conversions, &resolution.cpa) {
                (Some(conv), Some(cpa)) => md.push_str(&format!(
                    "*(Metrics: \"{}\" & \"{}\")*\n",
                    conv.caption, cpa.caption
                )),
                (Some(conv), None) => {
                    md.push_str(&format!("*(Metric: \"{}\")*\n", conv.caption))
                }
                _ => {}
            }
            for warning in [&resolution.conversion_warning, &resolution.cpa_warning]
                .into_iter()
                .flatten()
            {
                md.push_str(&format!("*{}*\n", escape(warning)));
            }
        }
        md.push('\n');
    }

    // Header + alignment row.
    let headers: Vec<String> = columns.iter().map(|c| escape(&c.header)).collect();
    let separators: Vec<String> = columns
        .iter()
        .map(|c| {
            let width = c.header.chars().count().max(3);
            if c.numeric {
                format!("{}:", "-".repeat(width))
            } else {
                "-".repeat(width)
            }
        })
        .collect();
    md.push_str(&format!("| {} |\n", headers.join(" | ")));
    md.push_str(&format!("| {} |\n", separators.join(" | ")));

    for row in rows.iter().take(DISPLAY_ROW_LIMIT) {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| render_cell(config.currency, column, row))
            .collect();
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    if let Some(active) = totals.active_rows {
        md.push_str(&format!(
            "Total active {} (w/ spend > $0): {}\n",
            config.breakdown.pretty().to_lowercase(),
            fmt_count(active as f64)
        ));
    }

    md.push_str(&format!(
        "\n**Totals:** Spent: {}",
        fmt_currency(config.currency, totals.spent)
    ));
    if config.conversion_rule_name.is_some() {
        if let Some(conv) = config.resolution.and_then(|r| r.conversions.as_ref()) {
            md.push_str(&format!(
                ", {}: {}",
                conv.caption,
                fmt_count(totals.conversions)
            ));
        }
    }
    md.push('\n');

    md.push_str(&format!("\n[See more in Realize ↗]({gui_link})"));

    RenderedReport {
        markdown: md,
        gui_link,
    }
}

fn render_cell(currency: &str, column: &Column, row: &ProjectedRow) -> String {
    let cell = row.cell(&column.key);
    match (column.key.as_str(), cell) {
        (_, Cell::Empty) => EMPTY_CELL.to_owned(),
        ("spent", Cell::Number(n)) => fmt_currency(currency, *n),
        ("cpa", Cell::Number(n)) => {
            let formatted = fmt_currency(currency, *n);
            match row.cpa_flag {
                CpaFlag::Good => format!("**{formatted}** 🟢"),
                CpaFlag::Bad => format!("**{formatted}** 🔴"),
                CpaFlag::None => formatted,
            }
        }
        ("ctr", Cell::Number(n)) => fmt_percent(*n),
        (_, Cell::Number(n)) => fmt_count(*n),
        (_, Cell::Text(s)) => escape(s),
    }
}

fn gui_link(config: &RenderConfig<'_>) -> String {
    let mut link = format!(
        "{}/campaigns?accountId={}&reportId={}&startDate={}&endDate={}",
        config::GUI_BASE_URL,
        config.account_id,
        config.breakdown.gui_report_id(),
        config.start_date,
        config.end_date
    );
    if let Some(rule_name) = config.conversion_rule_name {
        link.push_str("&conversionRuleName=");
        link.push_str(&urlencode(rule_name));
    }
    link
}

/// Escape pipes so cell values cannot break the table.
fn escape(value: &str) -> String {
    value.replace('|', "\\|")
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn currency_symbol(code: &str) -> String {
    match code {
        "USD" => "$".to_owned(),
        "EUR" => "€".to_owned(),
        "GBP" => "£".to_owned(),
        other => format!("{other} "),
    }
}

/// Currency amount with thousands separators and no decimals: $1,234.
pub fn fmt_currency(code: &str, value: f64) -> String {
    let negative = value < 0.0;
    let rounded = value.abs().round() as u64;
    let grouped = group_thousands(rounded);
    let symbol = currency_symbol(code);
    if negative {
        format!("-{symbol}{grouped}")
    } else {
        format!("{symbol}{grouped}")
    }
}

/// Plain count with thousands separators, no decimals.
pub fn fmt_count(value: f64) -> String {
    let negative = value < 0.0;
    let grouped = group_thousands(value.abs().round() as u64);
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Fraction rendered as a percentage with two decimals: 0.05 → 5.00%.
pub fn fmt_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Percent-encode everything outside the unreserved set.
fn urlencode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}
