//! Async wrapper around [`RealizeSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! The blocking SDK's internals are already thread-safe (mutex-guarded
//! caches), so the wrapper shares it behind a plain [`Arc`].
//!
//! # Example
//!
//! ```no_run
//! use realize_sdk::AsyncRealizeSdk;
//!
//! async fn example() -> realize_sdk::Result<()> {
//!     let sdk = AsyncRealizeSdk::builder().build().await?;
//!
//!     // Run any sync SDK method via closure
//!     let _accounts = sdk.run(|s| s.accounts().search("wonderskin")).await?;
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Credentials;
use crate::error::{RealizeError, Result};
use crate::RealizeSdk;

// ---------------------------------------------------------------------------
// AsyncRealizeSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncRealizeSdk`] instance.
#[derive(Default)]
pub struct AsyncRealizeSdkBuilder {
    credentials: Option<Credentials>,
    base_url: Option<String>,
    data_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl AsyncRealizeSdkBuilder {
    /// Set the API credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the API base URL. Intended for tests.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set a custom data directory for the local store.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the async SDK on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncRealizeSdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = RealizeSdk::builder();
            if let Some(credentials) = self.credentials {
                builder = builder.credentials(credentials);
            }
            if let Some(base_url) = self.base_url {
                builder = builder.base_url(base_url);
            }
            if let Some(dir) = self.data_dir {
                builder = builder.data_dir(dir);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            let sdk = builder.build()?;
            Ok(AsyncRealizeSdk {
                inner: Arc::new(sdk),
            })
        })
        .await
        .map_err(|e| RealizeError::RequestFailed(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncRealizeSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`RealizeSdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. Use [`run()`](Self::run) to execute
/// any sync SDK method.
#[derive(Clone)]
pub struct AsyncRealizeSdk {
    inner: Arc<RealizeSdk>,
}

impl AsyncRealizeSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncRealizeSdkBuilder {
        AsyncRealizeSdkBuilder::default()
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&RealizeSdk` reference and should return a
    /// `Result<T>`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use realize_sdk::AsyncRealizeSdk;
    /// # async fn example() -> realize_sdk::Result<()> {
    /// # let sdk = AsyncRealizeSdk::builder().build().await?;
    /// let rules = sdk
    ///     .run(|s| s.conversion_rules().valid("my-account-slug"))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&RealizeSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&sdk))
            .await
            .map_err(|e| RealizeError::RequestFailed(format!("task join error: {e}")))?
    }

    /// Search accounts asynchronously. Convenience wrapper around
    /// [`run()`](Self::run).
    pub async fn search_accounts(&self, term: &str) -> Result<crate::AccountSearch> {
        let term = term.to_owned();
        self.run(move |s| s.accounts().search(&term)).await
    }

    /// Fetch an account's valid conversion rules asynchronously.
    pub async fn valid_conversion_rules(
        &self,
        account_id: &str,
    ) -> Result<Vec<crate::ConversionRule>> {
        let account_id = account_id.to_owned();
        self.run(move |s| s.conversion_rules().valid(&account_id))
            .await
    }
}
