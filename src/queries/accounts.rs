//! Account search and sub-account listing.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config;
use crate::error::{RealizeError, Result};
use crate::models::{Account, AccountSearch};

/// Query interface for advertiser accounts.
pub struct AccountQuery<'a> {
    sdk: &'a crate::RealizeSdk,
}

impl<'a> AccountQuery<'a> {
    pub fn new(sdk: &'a crate::RealizeSdk) -> Self {
        Self { sdk }
    }

    // -- Search ------------------------------------------------------------

    /// Search accounts by name or slug fragment.
    ///
    /// Results are cached per trimmed term for the SDK's search TTL. Terms
    /// shorter than two characters are rejected before any network call.
    /// HTTP 400/404 mean "no matches", not an error.
    pub fn search(&self, term: &str) -> Result<AccountSearch> {
        let term = term.trim();
        if term.chars().count() < 2 {
            return Err(RealizeError::InvalidArgument(
                "search term must be at least 2 characters".into(),
            ));
        }

        if let Some(cached) = self.sdk.search_cache.get(&term.to_owned()) {
            debug!(term, "account search cache hit");
            return Ok(cached);
        }

        let query = [
            ("search_text", term.to_owned()),
            ("page_size", "10".to_owned()),
            ("page", "1".to_owned()),
        ];
        let mut search = match self
            .sdk
            .client
            .get_json::<AccountSearch>("taboola-network/advertisers", &query)
        {
            Ok(search) => search,
            // The API answers 400/404 for terms with no matches; that is
            // an empty result, not an error, and is not cached.
            Err(RealizeError::Api { status, .. }) if status == 400 || status == 404 => {
                return Ok(AccountSearch::default())
            }
            Err(err) => return Err(err),
        };
        search.results = search
            .results
            .into_iter()
            .map(Account::derive_flags)
            .collect();

        debug!(term, count = search.results.len(), "account search");
        self.sdk
            .search_cache
            .set(term.to_owned(), search.clone());
        Ok(search)
    }

    // -- Sub-accounts ------------------------------------------------------

    /// All advertiser accounts that are children of the given network.
    pub fn sub_accounts_for_network(&self, network_account_id: &str) -> Result<Vec<Account>> {
        let query = [
            ("network_account_id", network_account_id.to_owned()),
            ("page_size", "100".to_owned()),
            ("page", "1".to_owned()),
        ];
        match self
            .sdk
            .client
            .get_json::<AccountSearch>("taboola-network/advertisers", &query)
        {
            Ok(search) => Ok(search
                .results
                .into_iter()
                .map(Account::derive_flags)
                .collect()),
            Err(RealizeError::Api { status, .. }) if status == 400 || status == 404 => {
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Advertisers listed directly under an account, memoized per slug for
    /// the life of the SDK instance.
    pub fn sub_accounts(&self, account_id: &str) -> Result<Vec<Account>> {
        {
            let memo = self
                .sdk
                .sub_account_memo
                .lock()
                .expect("sub-account memo poisoned");
            if let Some(cached) = memo.get(account_id) {
                debug!(account_id, "sub-account cache hit");
                return Ok(cached.clone());
            }
        }

        #[derive(Deserialize)]
        struct SubAccountsResponse {
            results: Vec<Account>,
        }

        let response: SubAccountsResponse = self
            .sdk
            .client
            .get_json(&format!("{account_id}/advertisers"), &[])?;
        let accounts: Vec<Account> = response
            .results
            .into_iter()
            .map(Account::derive_flags)
            .collect();

        self.sdk
            .sub_account_memo
            .lock()
            .expect("sub-account memo poisoned")
            .insert(account_id.to_owned(), accounts.clone());
        Ok(accounts)
    }

    // -- Recents -----------------------------------------------------------

    /// The persisted recently-used accounts, most recent first.
    pub fn recent(&self) -> Vec<Account> {
        self.sdk
            .store
            .get::<Vec<Account>>(config::RECENT_ACCOUNTS_KEY)
            .unwrap_or_default()
    }

    /// Push an account to the front of the recents list, deduping by
    /// numeric id and capping the list length.
    pub fn push_recent(&self, account: &Account) -> Result<()> {
        let mut recents = self.recent();
        recents.retain(|existing| existing.id != account.id);
        recents.insert(0, account.clone());
        recents.truncate(config::RECENT_ACCOUNTS_LIMIT);
        if let Err(err) = self.sdk.store.set(config::RECENT_ACCOUNTS_KEY, &recents) {
            warn!(%err, "failed to persist recent accounts");
            return Err(err);
        }
        Ok(())
    }
}
