use std::path::PathBuf;
use std::time::Duration;

pub const BASE_URL: &str = "https://backstage.taboola.com/backstage";
pub const TOKEN_URL: &str = "https://backstage.taboola.com/backstage/oauth/token";
pub const GUI_BASE_URL: &str = "https://ads.realizeperformance.com";

/// Token expiry safety buffer: a token is considered expired one minute
/// before the server-reported expiry.
pub const TOKEN_SAFETY_MS: i64 = 60_000;
/// Applied when the token response omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

pub const ACCOUNT_SEARCH_TTL: Duration = Duration::from_secs(60 * 60 * 8);

/// Hard ceiling on a buffered report response body.
pub const MAX_RESPONSE_BYTES: u64 = 20 * 1024 * 1024;
/// Rows beyond this are truncated and flagged, not errored.
pub const MAX_REPORT_ROWS: usize = 10_000;

/// Site-breakdown streaming: parse at most this many rows, then serve
/// fixed-size pages sliced from the capped buffer.
pub const SITE_ROW_CAP: usize = 50;
pub const SITE_PAGE_SIZE: usize = 10;
pub const SITE_MAX_PAGE: usize = 5;

pub const RECENT_ACCOUNTS_LIMIT: usize = 5;

// Local store keys. The primary-rule key is suffixed with the account slug.
pub const TOKEN_STORE_KEY: &str = "access_token_json";
pub const RECENT_ACCOUNTS_KEY: &str = "recent_accounts";
pub const PRIMARY_RULE_KEY_PREFIX: &str = "primaryConversionRule_realize_";

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("realize-sdk")
    } else {
        PathBuf::from(".realize-sdk")
    }
}
