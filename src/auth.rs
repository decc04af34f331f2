//! Client-credentials token provider.
//!
//! Tokens are cached in memory and persisted through the local store so
//! restarts reuse a still-valid token. Expiry carries a one-minute safety
//! buffer. Every outgoing SDK request asks this provider for a bearer
//! token exactly once; any failure here is fatal for that request.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::map_transport_error;
use crate::config;
use crate::error::{RealizeError, Result};
use crate::store::Store;

/// API credentials for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Persisted token shape: the bearer value and its expiry epoch millis
/// (already shortened by the safety buffer).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedToken {
    value: String,
    expires: i64,
}

impl CachedToken {
    fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expires
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

pub struct TokenProvider {
    credentials: Option<Credentials>,
    token_url: String,
    store: Arc<Store>,
    http: reqwest::blocking::Client,
    in_memory: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        credentials: Option<Credentials>,
        token_url: String,
        store: Arc<Store>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            credentials,
            token_url,
            store,
            http,
            in_memory: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, exchanging credentials if no cached
    /// token is fresh.
    pub fn bearer_token(&self) -> Result<String> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        {
            let cached = self.in_memory.lock().expect("token cache poisoned");
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now_ms)) {
                return Ok(token.value.clone());
            }
        }

        if let Some(token) = self
            .store
            .get::<CachedToken>(config::TOKEN_STORE_KEY)
            .filter(|t| t.is_fresh(now_ms))
        {
            let value = token.value.clone();
            *self.in_memory.lock().expect("token cache poisoned") = Some(token);
            return Ok(value);
        }

        self.exchange(now_ms)
    }

    fn exchange(&self, now_ms: i64) -> Result<String> {
        let Some(credentials) = &self.credentials else {
            return Err(RealizeError::Config(
                "missing client_id or client_secret".into(),
            ));
        };
        if credentials.client_id.is_empty() || credentials.client_secret.is_empty() {
            return Err(RealizeError::Config(
                "missing client_id or client_secret".into(),
            ));
        }

        debug!(url = %self.token_url, "requesting new access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(RealizeError::Auth(format!(
                "token request failed: {status} - {body}"
            )));
        }

        let parsed: TokenResponse = response.json()?;
        let Some(access_token) = parsed.access_token else {
            return Err(RealizeError::Auth(
                "token response missing access_token".into(),
            ));
        };

        let lifetime = parsed
            .expires_in
            .unwrap_or(config::DEFAULT_TOKEN_LIFETIME_SECS);
        let token = CachedToken {
            value: access_token.clone(),
            expires: now_ms + lifetime * 1000 - config::TOKEN_SAFETY_MS,
        };
        self.store.set(config::TOKEN_STORE_KEY, &token)?;
        *self.in_memory.lock().expect("token cache poisoned") = Some(token);
        debug!("new access token obtained and cached");

        Ok(access_token)
    }
}
