//! Shared test fixtures for the Realize SDK integration tests.
//!
//! Provides builders for normalized report rows, conversion rules and a
//! temp-dir-backed SDK instance. No test in this suite touches the
//! network; everything exercises the pure pipeline stages and the local
//! store.

use realize_sdk::models::{Breakdown, ConversionRule, ReportRow};
use realize_sdk::{Credentials, RealizeSdk};

/// Create an SDK whose store lives in a temp dir. The caller must keep
/// the `TempDir` alive for the duration of the test.
#[allow(dead_code)]
pub fn sdk_with_temp_store() -> (RealizeSdk, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let sdk = RealizeSdk::builder()
        .credentials(Credentials {
            client_id: "test-client".into(),
            client_secret: "test-secret".into(),
        })
        .base_url("http://127.0.0.1:1")
        .token_url("http://127.0.0.1:1/oauth/token")
        .data_dir(tmp_dir.path())
        .build()
        .unwrap();
    (sdk, tmp_dir)
}

/// Normalize a JSON object into a `ReportRow` for the given breakdown.
#[allow(dead_code)]
pub fn row(breakdown: Breakdown, raw: serde_json::Value) -> ReportRow {
    ReportRow::from_raw(raw.as_object().unwrap().clone(), breakdown)
        .expect("fixture row failed shape validation")
}

/// A selectable conversion rule named as given.
#[allow(dead_code)]
pub fn rule(id: &str, display_name: &str) -> ConversionRule {
    ConversionRule {
        id: id.to_owned(),
        display_name: display_name.to_owned(),
        category: Some("MAKE_PURCHASE".to_owned()),
        status: Some("ACTIVE".to_owned()),
        rule_type: Some("EVENT_BASED".to_owned()),
        event_name: Some("purchase".to_owned()),
        last_received: Some("2026-08-01 10:00:00".to_owned()),
        total_received: Some(120),
        include_in_total_conversions: Some(true),
        advertiser_id: None,
        cpa_goal: None,
    }
}

/// A report response body with `count` site rows, each spending a little.
#[allow(dead_code)]
pub fn site_response_body(count: usize) -> String {
    let rows: Vec<String> = (1..=count)
        .map(|i| format!(r#"{{"site": "site-{i}.example", "spent": {}.5}}"#, i * 10))
        .collect();
    format!(
        r#"{{"timezone": "UTC", "results": [{}], "metadata": {{"total": {count}, "count": {count}}}}}"#,
        rows.join(", ")
    )
}
