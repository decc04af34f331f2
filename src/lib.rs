//! Realize SDK for Rust.
//!
//! Provides a high-level client for the Realize ads platform API: account
//! search, campaign listings, conversion rules, and spend/conversion
//! reports with markdown rendering and spreadsheet export. Authentication
//! (client-credentials OAuth), per-session caching and the persisted
//! primary-rule store are handled internally.
//!
//! # Quick start
//!
//! ```no_run
//! use realize_sdk::{Credentials, RealizeSdk};
//!
//! let sdk = RealizeSdk::builder()
//!     .credentials(Credentials {
//!         client_id: "id".into(),
//!         client_secret: "secret".into(),
//!     })
//!     .build()
//!     .unwrap();
//!
//! // Search accounts
//! let accounts = sdk.accounts().search("wonderskin").unwrap();
//!
//! // Fetch this account's conversion rules
//! let rules = sdk.conversion_rules().valid("my-account-slug").unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod project;
pub mod queries;
pub mod reconcile;
pub mod render;
pub mod selection;
pub mod store;
mod stream;

#[cfg(feature = "async")]
pub use async_client::AsyncRealizeSdk;
pub use auth::Credentials;
pub use cache::{SingleFlight, TtlCache};
pub use error::{RealizeError, Result};
pub use models::{
    Account, AccountSearch, Breakdown, Campaign, ConversionRule, ReportResult, ReportRow,
};
pub use queries::{ExportJob, ReportRequest};
pub use store::Store;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use auth::TokenProvider;
use client::Client;

// ---------------------------------------------------------------------------
// RealizeSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`RealizeSdk`] instance.
///
/// Use [`RealizeSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](RealizeSdkBuilder::build) to create the SDK.
pub struct RealizeSdkBuilder {
    credentials: Option<Credentials>,
    base_url: String,
    token_url: String,
    data_dir: Option<PathBuf>,
    timeout: Duration,
    search_ttl: Duration,
}

impl Default for RealizeSdkBuilder {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: config::BASE_URL.to_owned(),
            token_url: config::TOKEN_URL.to_owned(),
            data_dir: None,
            timeout: Duration::from_secs(120),
            search_ttl: config::ACCOUNT_SEARCH_TTL,
        }
    }
}

impl RealizeSdkBuilder {
    /// Set the API credentials for the client-credentials grant.
    ///
    /// Building without credentials is allowed (a previously persisted
    /// token may still be valid), but a token exchange will fail with a
    /// configuration error.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the API base URL. Intended for tests.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the token endpoint. Intended for tests.
    pub fn token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Set a custom data directory for the local store.
    ///
    /// If not set, the platform-appropriate default data directory is used.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the HTTP request timeout. Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the account-search cache TTL. Defaults to 8 hours.
    pub fn search_ttl(mut self, ttl: Duration) -> Self {
        self.search_ttl = ttl;
        self
    }

    /// Build the SDK, initializing the local store and HTTP client.
    ///
    /// No network traffic happens here; tokens are exchanged lazily on the
    /// first authenticated request.
    pub fn build(self) -> Result<RealizeSdk> {
        let data_dir = self.data_dir.unwrap_or_else(config::default_data_dir);
        let store = Arc::new(Store::open(&data_dir)?);
        let auth = TokenProvider::new(
            self.credentials,
            self.token_url,
            Arc::clone(&store),
            self.timeout,
        )?;
        let client = Client::new(self.base_url, auth, self.timeout)?;

        Ok(RealizeSdk {
            client,
            store,
            search_cache: TtlCache::new(self.search_ttl),
            sub_account_memo: Mutex::new(HashMap::new()),
            rule_flight: SingleFlight::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// RealizeSdk
// ---------------------------------------------------------------------------

/// The main entry point for the Realize SDK.
///
/// Owns the authenticated HTTP client, the local store, and the
/// per-session caches (account search TTL map, conversion-rule
/// single-flight map), and exposes domain-specific query interfaces as
/// lightweight borrowing wrappers.
///
/// Created via [`RealizeSdk::builder()`].
pub struct RealizeSdk {
    pub(crate) client: Client,
    pub(crate) store: Arc<Store>,
    pub(crate) search_cache: TtlCache<String, AccountSearch>,
    pub(crate) sub_account_memo: Mutex<HashMap<String, Vec<Account>>>,
    pub(crate) rule_flight: SingleFlight<Vec<ConversionRule>>,
}

impl RealizeSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> RealizeSdkBuilder {
        RealizeSdkBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    /// Access account search, sub-accounts and the recents list.
    pub fn accounts(&self) -> queries::accounts::AccountQuery<'_> {
        queries::accounts::AccountQuery::new(self)
    }

    /// Access the campaign listing interface.
    pub fn campaigns(&self) -> queries::campaigns::CampaignQuery<'_> {
        queries::campaigns::CampaignQuery::new(self)
    }

    /// Access conversion rules and the persisted primary rule.
    pub fn conversion_rules(&self) -> queries::conversion_rules::ConversionRuleQuery<'_> {
        queries::conversion_rules::ConversionRuleQuery::new(self)
    }

    /// Access the report pipeline: fetch, reconcile, project, render,
    /// export.
    pub fn reports(&self) -> queries::reports::ReportQuery<'_> {
        queries::reports::ReportQuery::new(self)
    }

    // -- Utility methods ---------------------------------------------------

    /// The local store backing tokens, recents and primary rules.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Drop all per-session caches (account search, sub-account memo).
    /// Persisted state is untouched.
    pub fn clear_caches(&self) {
        self.search_cache.clear();
        self.sub_account_memo
            .lock()
            .expect("sub-account memo poisoned")
            .clear();
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for RealizeSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RealizeSdk(base_url={}, data_dir={})",
            self.client.base_url(),
            self.store.dir().display()
        )
    }
}
