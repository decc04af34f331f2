//! Authenticated HTTP transport shared by the query modules.
//!
//! One blocking client per SDK. Every request carries the bearer header
//! from the token provider. Non-2xx responses become `Api` errors with the
//! body text; transport-level failures are surfaced distinctly so callers
//! can tell "the API rejected this" from "the network is down".

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::TokenProvider;
use crate::error::{RealizeError, Result};

pub struct Client {
    http: reqwest::blocking::Client,
    base_url: String,
    auth: TokenProvider,
}

impl Client {
    pub(crate) fn new(base_url: String, auth: TokenProvider, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/1.0/{}", self.base_url, path)
    }

    /// Issue an authenticated GET and return the raw 2xx response.
    pub(crate) fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response> {
        let token = self.auth.bearer_token()?;
        let url = self.api_url(path);
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(RealizeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// GET and deserialize a JSON body.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.get(path, query)?;
        Ok(response.json()?)
    }
}

/// Split transport failures from HTTP-level ones. A recognizable DNS
/// signal in the error chain gets the connection/VPN hint.
pub(crate) fn map_transport_error(err: reqwest::Error) -> RealizeError {
    if err.is_connect() || err.is_timeout() {
        let mut source: Option<&dyn std::error::Error> = std::error::Error::source(&err);
        while let Some(cause) = source {
            let text = cause.to_string().to_ascii_lowercase();
            if text.contains("dns") || text.contains("lookup") || text.contains("not known") {
                return RealizeError::Network(format!(
                    "host lookup failed ({err}); check your internet connection or VPN"
                ));
            }
            source = cause.source();
        }
        RealizeError::Network(format!("could not connect: {err}"))
    } else {
        RealizeError::Http(err)
    }
}
