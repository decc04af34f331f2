use serde::{Deserialize, Serialize};

use super::{opt_string_or_number, string_or_number};

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// A campaign's configuration as returned by the per-account campaigns
/// endpoint. The upstream object is far wider; this keeps the fields the
/// SDK surfaces for listing, filtering and detail display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub advertiser_id: Option<String>,
    pub name: String,
    pub branding_text: Option<String>,
    pub cpc: Option<f64>,
    pub daily_cap: Option<f64>,
    pub spending_limit: Option<f64>,
    pub spending_limit_model: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub approval_state: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub status: String,
    pub spent: Option<f64>,
    pub daily_ad_delivery_model: Option<String>,
    pub marketing_objective: Option<String>,
    pub bid_strategy: Option<String>,
    pub cpa_goal: Option<f64>,
    pub learning_state: Option<String>,
    pub conversion_rules: Option<CampaignConversionRules>,
    pub inventory_summary: Option<InventorySummary>,
}

impl Campaign {
    /// Whether the campaign counts as running for listing purposes:
    /// explicitly RUNNING, or active and not yet ended/archived.
    pub fn is_running(&self) -> bool {
        self.status == "RUNNING"
            || (self.status != "ENDED" && self.status != "ARCHIVED" && self.is_active)
    }
}

/// Conversion rules attached to a campaign, as summarized by the campaigns
/// endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignConversionRules {
    #[serde(default)]
    pub rules: Vec<CampaignRuleSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRuleSummary {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub status: Option<String>,
    pub include_in_total_conversions: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummary {
    pub number_of_items: Option<u64>,
    pub number_of_approved_items: Option<u64>,
    pub number_of_reject_items: Option<u64>,
}
