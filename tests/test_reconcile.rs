//! Metric reconciliation: caption matching, flat-field fallback, warnings.

mod common;

use realize_sdk::models::{Breakdown, DynamicFieldCaptions};
use realize_sdk::reconcile::resolve_metrics;
use serde_json::json;

fn captions(entries: &[(&str, &str)]) -> DynamicFieldCaptions {
    entries
        .iter()
        .map(|(id, caption)| (id.to_string(), caption.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Caption matching
// ---------------------------------------------------------------------------

#[test]
fn resolves_both_metrics_from_captions() {
    let rule = common::rule("77", "Rule X");
    let captions = captions(&[
        ("m1", "Rule X: Conversions (Clicks)"),
        ("m2", "Rule X: CPA (Clicks)"),
    ]);

    let resolution = resolve_metrics(&rule, &captions, &[]);
    assert_eq!(resolution.conversions.as_ref().unwrap().id, "m1");
    assert_eq!(resolution.cpa.as_ref().unwrap().id, "m2");
    assert!(resolution.conversion_warning.is_none());
    assert!(resolution.cpa_warning.is_none());
}

#[test]
fn caption_matching_is_case_insensitive() {
    let rule = common::rule("77", "purchase rule");
    let captions = captions(&[
        ("m1", "PURCHASE RULE: CONVERSIONS (CLICKS)"),
        ("m2", "Purchase Rule: CPA (Clicks)"),
    ]);

    let resolution = resolve_metrics(&rule, &captions, &[]);
    assert_eq!(resolution.conversions.as_ref().unwrap().id, "m1");
    assert_eq!(resolution.cpa.as_ref().unwrap().id, "m2");
}

#[test]
fn first_matching_caption_wins() {
    // Both captions contain the rule name; the scan stops at the first.
    let rule = common::rule("77", "Rule");
    let captions = captions(&[
        ("m1", "Rule A: Conversions (Clicks)"),
        ("m2", "Rule B: Conversions (Clicks)"),
    ]);

    let resolution = resolve_metrics(&rule, &captions, &[]);
    assert_eq!(resolution.conversions.as_ref().unwrap().id, "m1");
}

#[test]
fn caption_without_marker_does_not_match() {
    let rule = common::rule("77", "Rule X");
    let captions = captions(&[("m1", "Rule X: Conversions (Views)")]);

    let resolution = resolve_metrics(&rule, &captions, &[]);
    assert!(resolution.conversions.is_none());
    assert!(resolution.conversion_warning.is_some());
}

// ---------------------------------------------------------------------------
// Flat-field fallback
// ---------------------------------------------------------------------------

#[test]
fn empty_captions_fall_back_to_first_row_fields() {
    let rule = common::rule("77", "Rule X");
    let rows = vec![common::row(
        Breakdown::Day,
        json!({
            "date": "2026-07-01 00:00:00",
            "spent": 50.0,
            "cpa_actions_num_from_clicks": 3,
            "cpa_clicks": 20
        }),
    )];

    let resolution = resolve_metrics(&rule, &DynamicFieldCaptions::new(), &rows);
    let conversions = resolution.conversions.unwrap();
    assert_eq!(conversions.id, "cpa_actions_num_from_clicks");
    assert_eq!(conversions.caption, "Conversions (Clicks)");
    assert_eq!(rows[0].metric_f64(&conversions.id), Some(3.0));

    let cpa = resolution.cpa.unwrap();
    assert_eq!(cpa.id, "cpa_clicks");
    assert_eq!(rows[0].metric_f64(&cpa.id), Some(20.0));
}

#[test]
fn fallback_respects_priority_order() {
    let rule = common::rule("77", "Rule X");
    let rows = vec![common::row(
        Breakdown::Day,
        json!({
            "date": "2026-07-01 00:00:00",
            "spent": 50.0,
            "actions": 9,
            "actions_num_from_clicks": 7,
            "cpa": 11.0
        }),
    )];

    let resolution = resolve_metrics(&rule, &DynamicFieldCaptions::new(), &rows);
    assert_eq!(
        resolution.conversions.unwrap().id,
        "actions_num_from_clicks"
    );
    assert_eq!(resolution.cpa.unwrap().id, "cpa");
}

#[test]
fn fallback_skips_non_numeric_fields() {
    let rule = common::rule("77", "Rule X");
    let rows = vec![common::row(
        Breakdown::Day,
        json!({
            "date": "2026-07-01 00:00:00",
            "spent": 50.0,
            "cpa_actions_num_from_clicks": "three",
            "actions": 4
        }),
    )];

    let resolution = resolve_metrics(&rule, &DynamicFieldCaptions::new(), &rows);
    assert_eq!(resolution.conversions.unwrap().id, "actions");
}

#[test]
fn fallback_does_not_run_when_captions_matched_conversions() {
    let rule = common::rule("77", "Rule X");
    let captions = captions(&[("m1", "Rule X: Conversions (Clicks)")]);
    let rows = vec![common::row(
        Breakdown::Day,
        json!({
            "date": "2026-07-01 00:00:00",
            "spent": 50.0,
            "cpa_clicks": 20
        }),
    )];

    // Conversions matched in tier one, so the flat-field tier never runs
    // and CPA stays unresolved with a warning.
    let resolution = resolve_metrics(&rule, &captions, &rows);
    assert_eq!(resolution.conversions.unwrap().id, "m1");
    assert!(resolution.cpa.is_none());
    assert!(resolution.cpa_warning.is_some());
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[test]
fn unresolved_metrics_produce_warnings_naming_the_rule() {
    let rule = common::rule("77", "Orphan Rule");
    let resolution = resolve_metrics(&rule, &DynamicFieldCaptions::new(), &[]);

    assert!(resolution.conversions.is_none());
    assert!(resolution.cpa.is_none());
    assert!(resolution
        .conversion_warning
        .as_deref()
        .unwrap()
        .contains("Orphan Rule"));
    assert!(resolution
        .cpa_warning
        .as_deref()
        .unwrap()
        .contains("Orphan Rule"));
}
