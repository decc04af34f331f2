//! Markdown rendering on top of the projector output.

mod common;

use realize_sdk::models::Breakdown;
use realize_sdk::project::{column_schema, project_rows, totals, ProjectOptions};
use realize_sdk::reconcile::{MetricResolution, ResolvedMetric};
use realize_sdk::render::{build_markdown, RenderConfig};
use serde_json::json;

fn render_day_report(
    resolution: Option<&MetricResolution>,
    cpa_goal: Option<f64>,
) -> (String, String) {
    let rows = vec![
        common::row(
            Breakdown::Day,
            json!({
                "date": "2026-07-01 00:00:00",
                "spent": 1200.0,
                "dynamic_fields": [
                    {"id": "m1", "value": 4},
                    {"id": "m2", "value": 80}
                ]
            }),
        ),
        common::row(
            Breakdown::Day,
            json!({"date": "2026-07-02 00:00:00", "spent": 800.0}),
        ),
    ];

    let mut opts = ProjectOptions {
        cpa_goal,
        ..ProjectOptions::default()
    };
    if let Some(resolution) = resolution {
        opts.conversions = resolution.conversions.clone();
        opts.cpa = resolution.cpa.clone();
    }

    let columns = column_schema(Breakdown::Day, &opts);
    let projected = project_rows(&rows, Breakdown::Day, &opts);
    let report_totals = totals(
        &rows,
        Breakdown::Day,
        opts.conversions.as_ref().map(|m| m.id.as_str()),
    );

    let rendered = build_markdown(
        &RenderConfig {
            account_name: "Acme Corp",
            account_id: 4242,
            currency: "USD",
            breakdown: Breakdown::Day,
            start_date: "2026-07-01",
            end_date: "2026-07-31",
            conversion_rule_name: resolution.map(|_| "Purchase Rule"),
            resolution,
            cpa_goal,
        },
        &columns,
        &projected,
        &report_totals,
    );
    (rendered.markdown, rendered.gui_link)
}

fn resolution() -> MetricResolution {
    MetricResolution {
        conversions: Some(ResolvedMetric {
            id: "m1".into(),
            caption: "Purchase Rule: Conversions (Clicks)".into(),
        }),
        cpa: Some(ResolvedMetric {
            id: "m2".into(),
            caption: "Purchase Rule: CPA (Clicks)".into(),
        }),
        conversion_warning: None,
        cpa_warning: None,
    }
}

// ---------------------------------------------------------------------------
// Table content
// ---------------------------------------------------------------------------

#[test]
fn markdown_has_title_header_and_rows() {
    let (markdown, _) = render_day_report(None, None);

    assert!(markdown.starts_with("## Day Report for Acme Corp"));
    assert!(markdown.contains("| Date | Spent |"));
    assert!(markdown.contains("| 2026-07-01 | $1,200 |"));
    assert!(markdown.contains("| 2026-07-02 | $800 |"));
}

#[test]
fn totals_line_sums_the_full_row_set() {
    let (markdown, _) = render_day_report(None, None);
    assert!(markdown.contains("**Totals:** Spent: $2,000"));
}

#[test]
fn conversion_columns_render_with_captions_and_totals() {
    let resolution = resolution();
    let (markdown, _) = render_day_report(Some(&resolution), None);

    assert!(markdown.contains("**Using Conversion Rule:** Purchase Rule"));
    assert!(markdown.contains(
        "*(Metrics: \"Purchase Rule: Conversions (Clicks)\" & \"Purchase Rule: CPA (Clicks)\")*"
    ));
    assert!(markdown.contains("Purchase Rule: Conversions (Clicks) |"));
    // Second row reported nothing: dashes, not zeros.
    assert!(markdown.contains("| 2026-07-02 | $800 | – | – |"));
    assert!(markdown.contains("Purchase Rule: Conversions (Clicks): 4"));
}

#[test]
fn cpa_under_goal_is_marked_good() {
    let resolution = resolution();
    let (markdown, _) = render_day_report(Some(&resolution), Some(100.0));
    assert!(markdown.contains("**$80** 🟢"));
}

#[test]
fn reconciliation_warnings_surface_in_the_preamble() {
    let resolution = MetricResolution {
        conversions: None,
        cpa: None,
        conversion_warning: Some(
            "no \"Conversions (Clicks)\" metric found for \"Purchase Rule\"; check API mapping"
                .to_owned(),
        ),
        cpa_warning: None,
    };
    let (markdown, _) = render_day_report(Some(&resolution), None);
    assert!(markdown.contains("no \"Conversions (Clicks)\" metric found"));
}

// ---------------------------------------------------------------------------
// GUI link
// ---------------------------------------------------------------------------

#[test]
fn gui_link_carries_account_report_and_range() {
    let (_, link) = render_day_report(None, None);
    assert_eq!(
        link,
        "https://ads.realizeperformance.com/campaigns?accountId=4242&reportId=day\
         &startDate=2026-07-01&endDate=2026-07-31"
    );
}

#[test]
fn gui_link_encodes_the_rule_name() {
    let resolution = resolution();
    let (_, link) = render_day_report(Some(&resolution), None);
    assert!(link.ends_with("&conversionRuleName=Purchase%20Rule"));
}

#[test]
fn markdown_links_back_to_the_gui() {
    let (markdown, link) = render_day_report(None, None);
    assert!(markdown.contains(&format!("[See more in Realize ↗]({link})")));
}
