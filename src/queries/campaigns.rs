//! Campaign listing for an account.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config;
use crate::error::{RealizeError, Result};
use crate::models::Campaign;

/// Query interface for campaigns.
pub struct CampaignQuery<'a> {
    sdk: &'a crate::RealizeSdk,
}

impl<'a> CampaignQuery<'a> {
    pub fn new(sdk: &'a crate::RealizeSdk) -> Self {
        Self { sdk }
    }

    /// All campaigns for an account.
    ///
    /// The endpoint has been observed returning both `{results: [...]}`
    /// and a bare array; both shapes are accepted. Anything else yields an
    /// empty list, not an error.
    pub fn list(&self, account_id: &str) -> Result<Vec<Campaign>> {
        if account_id.is_empty() {
            return Err(RealizeError::InvalidArgument(
                "account slug is required to fetch campaigns".into(),
            ));
        }

        let response: Value = self
            .sdk
            .client
            .get_json(&format!("{account_id}/campaigns/"), &[])?;

        let campaigns: Vec<Campaign> = if let Some(results) =
            response.get("results").filter(|r| r.is_array())
        {
            serde_json::from_value(results.clone())?
        } else if response.is_array() {
            serde_json::from_value(response)?
        } else {
            warn!(account_id, "unexpected campaign response shape");
            Vec::new()
        };

        debug!(account_id, count = campaigns.len(), "fetched campaigns");
        Ok(campaigns)
    }

    /// Campaigns currently running: explicitly RUNNING, or active and not
    /// ended/archived.
    pub fn running(&self, account_id: &str) -> Result<Vec<Campaign>> {
        let campaigns = self.list(account_id)?;
        Ok(campaigns.into_iter().filter(Campaign::is_running).collect())
    }

    /// Deep link to the campaign in the Realize web GUI. Takes the numeric
    /// account id, not the slug.
    pub fn gui_url(&self, numeric_account_id: i64, campaign_id: &str) -> String {
        format!(
            "{}/campaigns?locale=en&accountId={numeric_account_id}&dimension=SPONSORED\
             &reportEntityIds={campaign_id}&reportEntityType=CAMPAIGN&reportId=campaign",
            config::GUI_BASE_URL
        )
    }
}
