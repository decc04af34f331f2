use serde::{Deserialize, Serialize};

use super::{opt_string_or_number, string_or_number};

/// Conversion categories considered relevant for rule selection.
pub const RELEVANT_CATEGORIES: &[&str] = &["MAKE_PURCHASE", "LEAD", "APP_INSTALL"];

// ---------------------------------------------------------------------------
// ConversionRule
// ---------------------------------------------------------------------------

/// A server-side tracked goal event an advertiser can attribute spend
/// against.
///
/// `cpa_goal` is the only locally-mutated field; it is set by the user and
/// persisted together with the rule when the rule is pinned as primary for
/// an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRule {
    pub id: String,
    pub display_name: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub rule_type: Option<String>,
    pub event_name: Option<String>,
    pub last_received: Option<String>,
    pub total_received: Option<i64>,
    pub include_in_total_conversions: Option<bool>,
    /// Slug of the owning advertiser; may differ from the account the rule
    /// was fetched through when the account is a network.
    pub advertiser_id: Option<String>,
    /// User-entered CPA target, persisted locally with the primary rule.
    pub cpa_goal: Option<f64>,
}

impl ConversionRule {
    /// Whether the rule may be offered for selection: active, a relevant
    /// category, and counted in total conversions.
    pub fn is_selectable(&self) -> bool {
        self.status.as_deref() == Some("ACTIVE")
            && self
                .category
                .as_deref()
                .map(|c| RELEVANT_CATEGORIES.contains(&c))
                .unwrap_or(false)
            && self.include_in_total_conversions == Some(true)
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// The nested rule object inside a conversion-rule API row.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiUnipConversionRule {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub display_name: String,
    pub category: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: Option<String>,
    pub event_name: Option<String>,
    pub include_in_total_conversions: Option<bool>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub advertiser_id: Option<String>,
}

/// One row of the conversion-rule endpoint: receipt counters wrapping the
/// rule itself.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiConversionRuleWrapper {
    pub last_received: Option<String>,
    pub total_received: Option<i64>,
    pub unip_conversion_rule: ApiUnipConversionRule,
}

/// Parse the conversion-rule endpoint payload. The endpoint has been
/// observed returning both a bare array and `{results: [...]}`; any other
/// shape yields `None`.
pub fn parse_rules_payload(
    value: serde_json::Value,
) -> serde_json::Result<Option<Vec<ConversionRule>>> {
    let wrappers: Vec<ApiConversionRuleWrapper> = if value.is_array() {
        serde_json::from_value(value)?
    } else if let Some(results) = value.get("results").filter(|r| r.is_array()) {
        serde_json::from_value(results.clone())?
    } else {
        return Ok(None);
    };
    Ok(Some(wrappers.into_iter().map(Into::into).collect()))
}

impl From<ApiConversionRuleWrapper> for ConversionRule {
    fn from(wrapper: ApiConversionRuleWrapper) -> Self {
        let rule = wrapper.unip_conversion_rule;
        ConversionRule {
            id: rule.id,
            display_name: rule.display_name,
            category: rule.category,
            status: rule.status,
            rule_type: rule.rule_type,
            event_name: rule.event_name,
            last_received: wrapper.last_received,
            total_received: wrapper.total_received,
            include_in_total_conversions: rule.include_in_total_conversions,
            advertiser_id: rule.advertiser_id,
            cpa_goal: None,
        }
    }
}
