//! CSV export over the projector contract.

mod common;

use realize_sdk::export::{write_bundle, write_single, ExportOptions};
use realize_sdk::models::Breakdown;
use realize_sdk::project::{column_schema, project_rows, ProjectOptions};
use realize_sdk::reconcile::ResolvedMetric;
use serde_json::json;

fn campaign_fixture() -> (Vec<realize_sdk::project::Column>, Vec<realize_sdk::project::ProjectedRow>) {
    let opts = ProjectOptions {
        conversions: Some(ResolvedMetric {
            id: "m1".into(),
            caption: "Rule: Conversions (Clicks)".into(),
        }),
        ..ProjectOptions::default()
    };
    let rows = vec![
        common::row(
            Breakdown::Campaign,
            json!({
                "campaign": "100", "campaign_name": "Summer | Sale", "spent": 12.5,
                "dynamic_fields": [{"id": "m1", "value": 3}]
            }),
        ),
        common::row(
            Breakdown::Campaign,
            json!({"campaign": "101", "campaign_name": "Winter", "spent": 0.0}),
        ),
    ];
    let columns = column_schema(Breakdown::Campaign, &opts);
    let projected = project_rows(&rows, Breakdown::Campaign, &opts);
    (columns, projected)
}

#[test]
fn single_export_writes_headers_and_cells() {
    let tmp = tempfile::tempdir().unwrap();
    let (columns, projected) = campaign_fixture();

    let path = write_single(
        tmp.path(),
        Breakdown::Campaign,
        &columns,
        &projected,
        &ExportOptions {
            account_name: Some("Acme Corp"),
            start_date: Some("2026-07-01"),
            end_date: Some("2026-07-31"),
        },
    )
    .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "RealizeReport-Acme_Corp-campaign_breakdown-2026-07-01_to_2026-07-31.csv"
    );

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Campaign ID,Campaign Name,Spent,Rule: Conversions (Clicks)"
    );
    assert_eq!(lines.next().unwrap(), "100,Summer | Sale,12.5,3");
    // Unreported conversions export as empty, not zero.
    assert_eq!(lines.next().unwrap(), "101,Winter,0,");
}

#[test]
fn bundle_export_writes_one_file_per_breakdown() {
    let tmp = tempfile::tempdir().unwrap();
    let (columns, projected) = campaign_fixture();

    let day_rows = vec![common::row(
        Breakdown::Day,
        json!({"date": "2026-07-01 00:00:00", "spent": 9.0}),
    )];
    let day_opts = ProjectOptions::default();
    let day_columns = column_schema(Breakdown::Day, &day_opts);
    let day_projected = project_rows(&day_rows, Breakdown::Day, &day_opts);

    let paths = write_bundle(
        tmp.path(),
        &[
            (Breakdown::Campaign, columns, projected),
            (Breakdown::Day, day_columns, day_projected),
        ],
        &ExportOptions {
            account_name: Some("Acme"),
            start_date: Some("2026-07-01"),
            end_date: Some("2026-07-31"),
        },
    )
    .unwrap();

    assert_eq!(paths.len(), 2);
    assert!(paths[0]
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .contains("campaign_breakdown"));
    assert!(paths[1].file_name().unwrap().to_str().unwrap().contains("-day-"));
    for path in &paths {
        assert!(path.exists());
    }

    let day_contents = std::fs::read_to_string(&paths[1]).unwrap();
    assert!(day_contents.starts_with("Date,Spent\n"));
    assert!(day_contents.contains("2026-07-01,9"));
}

#[test]
fn ctr_exports_as_a_fraction() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = ProjectOptions {
        clicks_metric_id: Some("clicks".into()),
        impressions_metric_id: Some("impressions".into()),
        ..ProjectOptions::default()
    };
    let rows = vec![common::row(
        Breakdown::Item,
        json!({"item": "9", "item_name": "Ad", "spent": 1.0,
               "clicks": 50, "impressions": 1000}),
    )];
    let columns = column_schema(Breakdown::Item, &opts);
    let projected = project_rows(&rows, Breakdown::Item, &opts);

    let path = write_single(
        tmp.path(),
        Breakdown::Item,
        &columns,
        &projected,
        &ExportOptions::default(),
    )
    .unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("9,Ad,1,50,0.05"));
}
