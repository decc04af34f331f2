//! Conversion-rule selection state machine.
//!
//! States: no rule → rule selected, with clear and replace transitions.
//! Selecting a rule owned by a different advertiser triggers an explicit
//! account context switch when the advertiser resolves against the known
//! sub-account list. Every transition returns an event value carrying any
//! guidance message; no transition is silent.

use crate::error::{RealizeError, Result};
use crate::models::{Account, ConversionRule};

#[derive(Debug, Clone)]
pub enum SelectionEvent {
    /// A rule is now active; the CPA-goal input is enabled and pre-filled
    /// from the rule's stored goal.
    Selected {
        rule: ConversionRule,
        cpa_goal_prefill: Option<f64>,
        /// Id of the rule that was active before, when this replaced one.
        replaced: Option<String>,
    },
    Cleared,
    /// The rule belongs to a resolvable sub-account; the active account
    /// was swapped and no rule is selected.
    SwitchedAccount { account: Account, notice: String },
    /// The rule belongs to another advertiser that is not in the known
    /// sub-account list; it is accepted with a notice.
    ForeignAdvertiser {
        rule: ConversionRule,
        advertiser_id: String,
        notice: String,
    },
    /// The rule is not in the account's valid set.
    Rejected { notice: String },
}

pub struct RuleSelector {
    account: Account,
    valid_rules: Vec<ConversionRule>,
    sub_accounts: Vec<Account>,
    active: Option<ConversionRule>,
}

impl RuleSelector {
    pub fn new(
        account: Account,
        valid_rules: Vec<ConversionRule>,
        sub_accounts: Vec<Account>,
    ) -> Self {
        Self {
            account,
            valid_rules,
            sub_accounts,
            active: None,
        }
    }

    /// Pre-select a persisted primary rule. Honored only if the rule is
    /// still in the valid set for this account.
    pub fn with_primary(mut self, primary: Option<ConversionRule>) -> Self {
        self.active =
            primary.filter(|rule| self.valid_rules.iter().any(|valid| valid.id == rule.id));
        self
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn active_rule(&self) -> Option<&ConversionRule> {
        self.active.as_ref()
    }

    /// The CPA-goal input is enabled exactly while a rule is selected.
    pub fn cpa_goal_input_enabled(&self) -> bool {
        self.active.is_some()
    }

    pub fn select(&mut self, rule: ConversionRule) -> SelectionEvent {
        if !self.valid_rules.iter().any(|valid| valid.id == rule.id) {
            self.active = None;
            return SelectionEvent::Rejected {
                notice: "Selected rule is not valid for this account. Select a valid \
                         conversion rule or choose a sub-account."
                    .into(),
            };
        }

        if let Some(advertiser_id) = rule
            .advertiser_id
            .as_deref()
            .filter(|adv| *adv != self.account.account_id)
        {
            if let Some(sub) = self
                .sub_accounts
                .iter()
                .find(|acc| acc.account_id == advertiser_id)
                .cloned()
            {
                let notice = format!(
                    "Rule belongs to advertiser {advertiser_id}; switched reporting to \
                     sub-account {} ({}).",
                    sub.name, sub.account_id
                );
                self.account = sub.clone();
                self.active = None;
                return SelectionEvent::SwitchedAccount {
                    account: sub,
                    notice,
                };
            }

            let notice = format!(
                "Rule is for advertiser {advertiser_id}, not the current account \
                 ({}). No matching sub-account was found.",
                self.account.account_id
            );
            let advertiser_id = advertiser_id.to_owned();
            self.active = Some(rule.clone());
            return SelectionEvent::ForeignAdvertiser {
                rule,
                advertiser_id,
                notice,
            };
        }

        let replaced = self.active.take().map(|previous| previous.id);
        let cpa_goal_prefill = rule.cpa_goal;
        self.active = Some(rule.clone());
        SelectionEvent::Selected {
            rule,
            cpa_goal_prefill,
            replaced,
        }
    }

    pub fn clear(&mut self) -> SelectionEvent {
        self.active = None;
        SelectionEvent::Cleared
    }

    /// Guidance shown when the account has no valid rules: networks are
    /// pointed at their sub-accounts, child accounts at their parent.
    pub fn guidance(&self) -> Option<String> {
        if !self.valid_rules.is_empty() {
            return None;
        }
        let message = if self.account.is_network {
            if self.sub_accounts.is_empty() {
                "No conversion rules or sub-accounts found for this network."
            } else {
                "No conversion rules found for this network. Drill down to a \
                 sub-account to check for available rules."
            }
        } else if self.account.network_account_id.is_some() {
            "No conversion rules found for this account. Check the parent network \
             for available rules."
        } else {
            "No conversion rules found for this account."
        };
        Some(message.to_owned())
    }
}

/// Parse and validate a CPA-goal input: empty means no goal, otherwise a
/// positive integer in [10, 1000). Validated before any request is issued.
pub fn parse_cpa_goal(input: &str) -> Result<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let valid = trimmed.chars().all(|c| c.is_ascii_digit());
    let value: f64 = if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    };
    if !valid || !(10.0..1000.0).contains(&value) {
        return Err(RealizeError::InvalidArgument(
            "CPA goal must be a positive integer between 10 and 1000".into(),
        ));
    }
    Ok(Some(value))
}
