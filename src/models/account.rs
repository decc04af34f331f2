use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Account — a search/listing result from the advertisers endpoint
// ---------------------------------------------------------------------------

/// An advertiser account as returned by account search.
///
/// `id` is the numeric identifier used for GUI URLs; `account_id` is the
/// string slug embedded in API paths. The two are distinct and not
/// interchangeable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_id: String,
    pub currency: Option<String>,
    /// NETWORK, PARTNER, ADVERTISER or any future value.
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// Derived from `account_type` after parsing; not part of the wire shape.
    #[serde(default)]
    pub is_network: bool,
    /// Slug of the parent network, when this is a child account.
    pub network_account_id: Option<String>,
}

impl Account {
    /// Recompute the derived `is_network` flag from the raw account type.
    pub(crate) fn derive_flags(mut self) -> Self {
        self.is_network = self.account_type.as_deref() == Some("NETWORK");
        self
    }
}

/// Result-count metadata attached to account searches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub total: u64,
    pub count: u64,
}

/// An account search result set plus its metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSearch {
    pub results: Vec<Account>,
    #[serde(default)]
    pub metadata: SearchMetadata,
}
