//! Conversion-rule validity, primary-rule persistence and the selection
//! state machine.

mod common;

use realize_sdk::models::conversion_rule::parse_rules_payload;
use realize_sdk::models::Account;
use realize_sdk::selection::{parse_cpa_goal, RuleSelector, SelectionEvent};

fn account(slug: &str, account_type: &str) -> Account {
    Account {
        id: 42,
        name: format!("{slug} account"),
        account_id: slug.to_owned(),
        currency: Some("USD".to_owned()),
        account_type: Some(account_type.to_owned()),
        is_network: account_type == "NETWORK",
        network_account_id: None,
    }
}

// ---------------------------------------------------------------------------
// Validity filter
// ---------------------------------------------------------------------------

#[test]
fn paused_rules_are_not_selectable() {
    let mut rule = common::rule("1", "Paused Rule");
    rule.status = Some("PAUSED".to_owned());
    assert!(!rule.is_selectable());
}

#[test]
fn rules_outside_total_conversions_are_not_selectable() {
    let mut rule = common::rule("1", "Excluded Rule");
    rule.include_in_total_conversions = Some(false);
    assert!(!rule.is_selectable());

    rule.include_in_total_conversions = None;
    assert!(!rule.is_selectable());
}

#[test]
fn irrelevant_categories_are_not_selectable() {
    let mut rule = common::rule("1", "Page View Rule");
    rule.category = Some("PAGE_VIEW".to_owned());
    assert!(!rule.is_selectable());

    rule.category = None;
    assert!(!rule.is_selectable());
}

#[test]
fn active_relevant_included_rules_are_selectable() {
    for category in ["MAKE_PURCHASE", "LEAD", "APP_INSTALL"] {
        let mut rule = common::rule("1", "Good Rule");
        rule.category = Some(category.to_owned());
        assert!(rule.is_selectable(), "category {category}");
    }
}

// ---------------------------------------------------------------------------
// Primary rule persistence
// ---------------------------------------------------------------------------

#[test]
fn primary_rule_roundtrips_through_the_store_with_goal() {
    let (sdk, _tmp) = common::sdk_with_temp_store();

    assert!(sdk.conversion_rules().primary("acme-slug").is_none());

    let mut rule = common::rule("55", "Purchase Rule");
    rule.cpa_goal = Some(120.0);
    sdk.conversion_rules()
        .set_primary("acme-slug", &rule)
        .unwrap();

    let loaded = sdk.conversion_rules().primary("acme-slug").unwrap();
    assert_eq!(loaded.id, "55");
    assert_eq!(loaded.cpa_goal, Some(120.0));

    // Per-account keys do not collide.
    assert!(sdk.conversion_rules().primary("other-slug").is_none());

    sdk.conversion_rules().clear_primary("acme-slug").unwrap();
    assert!(sdk.conversion_rules().primary("acme-slug").is_none());
}

// ---------------------------------------------------------------------------
// Selection state machine
// ---------------------------------------------------------------------------

#[test]
fn selecting_a_valid_rule_enables_the_goal_input_with_prefill() {
    let mut rule = common::rule("1", "Purchase Rule");
    rule.cpa_goal = Some(90.0);
    let mut selector = RuleSelector::new(
        account("acme", "ADVERTISER"),
        vec![rule.clone()],
        Vec::new(),
    );

    assert!(!selector.cpa_goal_input_enabled());
    let event = selector.select(rule);
    let SelectionEvent::Selected {
        cpa_goal_prefill,
        replaced,
        ..
    } = event
    else {
        panic!("expected Selected event");
    };
    assert_eq!(cpa_goal_prefill, Some(90.0));
    assert!(replaced.is_none());
    assert!(selector.cpa_goal_input_enabled());
}

#[test]
fn selecting_again_reports_the_replaced_rule() {
    let first = common::rule("1", "First");
    let second = common::rule("2", "Second");
    let mut selector = RuleSelector::new(
        account("acme", "ADVERTISER"),
        vec![first.clone(), second.clone()],
        Vec::new(),
    );

    selector.select(first);
    let SelectionEvent::Selected { replaced, .. } = selector.select(second) else {
        panic!("expected Selected event");
    };
    assert_eq!(replaced.as_deref(), Some("1"));
}

#[test]
fn clearing_returns_to_no_rule() {
    let rule = common::rule("1", "Rule");
    let mut selector = RuleSelector::new(
        account("acme", "ADVERTISER"),
        vec![rule.clone()],
        Vec::new(),
    );
    selector.select(rule);

    assert!(matches!(selector.clear(), SelectionEvent::Cleared));
    assert!(selector.active_rule().is_none());
    assert!(!selector.cpa_goal_input_enabled());
}

#[test]
fn unknown_rules_are_rejected_with_a_notice() {
    let mut selector =
        RuleSelector::new(account("acme", "ADVERTISER"), Vec::new(), Vec::new());
    let event = selector.select(common::rule("99", "Stranger"));

    assert!(matches!(event, SelectionEvent::Rejected { .. }));
    assert!(selector.active_rule().is_none());
}

#[test]
fn foreign_advertiser_with_known_sub_account_switches_context() {
    let mut rule = common::rule("1", "Sub Rule");
    rule.advertiser_id = Some("child-slug".to_owned());
    let child = account("child-slug", "ADVERTISER");
    let mut selector = RuleSelector::new(
        account("network-slug", "NETWORK"),
        vec![rule.clone()],
        vec![child],
    );

    let event = selector.select(rule);
    let SelectionEvent::SwitchedAccount { account, notice } = event else {
        panic!("expected SwitchedAccount event");
    };
    assert_eq!(account.account_id, "child-slug");
    assert!(notice.contains("child-slug"));
    // The switch is a context change, not a selection.
    assert!(selector.active_rule().is_none());
    assert_eq!(selector.account().account_id, "child-slug");
}

#[test]
fn foreign_advertiser_without_sub_account_is_accepted_with_notice() {
    let mut rule = common::rule("1", "Sub Rule");
    rule.advertiser_id = Some("unknown-slug".to_owned());
    let mut selector = RuleSelector::new(
        account("network-slug", "NETWORK"),
        vec![rule.clone()],
        Vec::new(),
    );

    let event = selector.select(rule);
    let SelectionEvent::ForeignAdvertiser {
        advertiser_id,
        notice,
        ..
    } = event
    else {
        panic!("expected ForeignAdvertiser event");
    };
    assert_eq!(advertiser_id, "unknown-slug");
    assert!(notice.contains("unknown-slug"));
    assert!(selector.active_rule().is_some());
}

#[test]
fn persisted_primary_is_honored_only_when_still_valid() {
    let rule = common::rule("1", "Rule");
    let selector = RuleSelector::new(
        account("acme", "ADVERTISER"),
        vec![rule.clone()],
        Vec::new(),
    )
    .with_primary(Some(rule));
    assert!(selector.active_rule().is_some());

    let stale = common::rule("9", "Gone Rule");
    let selector = RuleSelector::new(
        account("acme", "ADVERTISER"),
        vec![common::rule("1", "Rule")],
        Vec::new(),
    )
    .with_primary(Some(stale));
    assert!(selector.active_rule().is_none());
}

#[test]
fn guidance_depends_on_account_shape() {
    let network_with_subs = RuleSelector::new(
        account("net", "NETWORK"),
        Vec::new(),
        vec![account("child", "ADVERTISER")],
    );
    assert!(network_with_subs
        .guidance()
        .unwrap()
        .contains("Drill down"));

    let lone_network = RuleSelector::new(account("net", "NETWORK"), Vec::new(), Vec::new());
    assert!(lone_network.guidance().unwrap().contains("sub-accounts"));

    let mut child = account("child", "ADVERTISER");
    child.network_account_id = Some("net".to_owned());
    let child_selector = RuleSelector::new(child, Vec::new(), Vec::new());
    assert!(child_selector
        .guidance()
        .unwrap()
        .contains("parent network"));

    let with_rules = RuleSelector::new(
        account("acme", "ADVERTISER"),
        vec![common::rule("1", "Rule")],
        Vec::new(),
    );
    assert!(with_rules.guidance().is_none());
}

// ---------------------------------------------------------------------------
// CPA goal input
// ---------------------------------------------------------------------------

#[test]
fn cpa_goal_bounds_are_enforced() {
    assert_eq!(parse_cpa_goal("").unwrap(), None);
    assert_eq!(parse_cpa_goal("  ").unwrap(), None);
    assert_eq!(parse_cpa_goal("10").unwrap(), Some(10.0));
    assert_eq!(parse_cpa_goal("999").unwrap(), Some(999.0));
    assert!(parse_cpa_goal("9").is_err());
    assert!(parse_cpa_goal("1000").is_err());
    assert!(parse_cpa_goal("-50").is_err());
    assert!(parse_cpa_goal("12.5").is_err());
    assert!(parse_cpa_goal("abc").is_err());
}

// ---------------------------------------------------------------------------
// Wire-shape flattening
// ---------------------------------------------------------------------------

#[test]
fn wrapper_rows_flatten_with_stringified_ids() {
    let body = serde_json::json!([
        {
            "last_received": "2026-08-01 09:00:00",
            "total_received": 31,
            "unip_conversion_rule": {
                "id": 9001,
                "display_name": "Purchase",
                "category": "MAKE_PURCHASE",
                "status": "ACTIVE",
                "type": "EVENT_BASED",
                "event_name": "purchase",
                "include_in_total_conversions": true,
                "advertiser_id": 555
            }
        }
    ]);

    let rules = parse_rules_payload(body).unwrap().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, "9001");
    assert_eq!(rules[0].display_name, "Purchase");
    assert_eq!(rules[0].advertiser_id.as_deref(), Some("555"));
    assert_eq!(rules[0].total_received, Some(31));
    assert_eq!(rules[0].rule_type.as_deref(), Some("EVENT_BASED"));
    assert!(rules[0].is_selectable());
}

#[test]
fn results_wrapped_payloads_parse_too() {
    let body = serde_json::json!({
        "results": [
            {
                "last_received": null,
                "total_received": null,
                "unip_conversion_rule": {
                    "id": "lead-1",
                    "display_name": "Lead",
                    "category": "LEAD",
                    "status": "ACTIVE",
                    "include_in_total_conversions": true
                }
            }
        ]
    });

    let rules = parse_rules_payload(body).unwrap().unwrap();
    assert_eq!(rules[0].id, "lead-1");
    assert!(rules[0].last_received.is_none());
}

#[test]
fn unexpected_payload_shapes_yield_none() {
    assert!(parse_rules_payload(serde_json::json!({"status": "ok"}))
        .unwrap()
        .is_none());
    assert!(parse_rules_payload(serde_json::json!("nope"))
        .unwrap()
        .is_none());
}
