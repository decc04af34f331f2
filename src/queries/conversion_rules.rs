//! Conversion-rule fetching and the persisted primary rule per account.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config;
use crate::error::{RealizeError, Result};
use crate::models::conversion_rule::parse_rules_payload;
use crate::models::ConversionRule;

/// Query interface for conversion rules.
pub struct ConversionRuleQuery<'a> {
    sdk: &'a crate::RealizeSdk,
}

impl<'a> ConversionRuleQuery<'a> {
    pub fn new(sdk: &'a crate::RealizeSdk) -> Self {
        Self { sdk }
    }

    // -- Fetching ----------------------------------------------------------

    /// Fetch the account's conversion rules.
    ///
    /// Concurrent calls for the same slug share one in-flight request;
    /// the success is memoized for the SDK's lifetime and a failure evicts
    /// the shared slot so a retry starts fresh. A 404 means the account
    /// simply has no rules.
    pub fn fetch(&self, account_id: &str) -> Result<Vec<ConversionRule>> {
        self.sdk
            .rule_flight
            .run(account_id, || self.fetch_uncached(account_id))
    }

    /// Rules offered for selection: active, relevant category, counted in
    /// total conversions.
    pub fn valid(&self, account_id: &str) -> Result<Vec<ConversionRule>> {
        let rules = self.fetch(account_id)?;
        Ok(rules
            .into_iter()
            .filter(ConversionRule::is_selectable)
            .collect())
    }

    /// Drop the memoized rule list for a slug, forcing a refetch.
    pub fn invalidate(&self, account_id: &str) {
        self.sdk.rule_flight.invalidate(account_id);
    }

    fn fetch_uncached(&self, account_id: &str) -> Result<Vec<ConversionRule>> {
        debug!(account_id, "fetching conversion rules");
        let path = format!("{account_id}/universal_pixel/conversion_rule/data");

        let response: Value = match self.sdk.client.get_json(&path, &[]) {
            Ok(value) => value,
            Err(RealizeError::Api { status: 404, .. }) => {
                debug!(account_id, "no conversion rules (404)");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let Some(rules) = parse_rules_payload(response)? else {
            warn!(account_id, "unexpected conversion-rule response shape");
            return Ok(Vec::new());
        };

        debug!(account_id, count = rules.len(), "processed conversion rules");
        Ok(rules)
    }

    // -- Primary rule persistence -------------------------------------------

    /// The locally pinned primary rule for an account, if any. The stored
    /// rule carries the user's CPA goal.
    pub fn primary(&self, account_id: &str) -> Option<ConversionRule> {
        self.sdk.store.get(&primary_key(account_id))
    }

    /// Pin a rule (with its CPA goal) as the account's primary.
    pub fn set_primary(&self, account_id: &str, rule: &ConversionRule) -> Result<()> {
        self.sdk.store.set(&primary_key(account_id), rule)?;
        debug!(
            account_id,
            rule = %rule.id,
            cpa_goal = ?rule.cpa_goal,
            "saved primary rule"
        );
        Ok(())
    }

    pub fn clear_primary(&self, account_id: &str) -> Result<()> {
        self.sdk.store.remove(&primary_key(account_id))
    }
}

fn primary_key(account_id: &str) -> String {
    format!("{}{account_id}", config::PRIMARY_RULE_KEY_PREFIX)
}
