// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP-backed service implementations.
//!
//! - [`NominatimSearch`]: OpenStreetMap Nominatim place search
//! - [`OsrmRouter`]: OSRM driving routes
//! - [`CommonsImagery`]: nearest Wikimedia Commons photo as a preview

mod commons;
mod nominatim;
mod osrm;

pub use commons::{CommonsImagery, DEFAULT_COMMONS_URL};
pub use nominatim::{NominatimSearch, DEFAULT_NOMINATIM_URL};
pub use osrm::{OsrmRouter, DEFAULT_OSRM_URL};

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

/// Default user agent. Nominatim's usage policy requires an identifying one.
pub const DEFAULT_USER_AGENT: &str = concat!("placefinder-desktop/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Error building a provider.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Settings shared by every HTTP provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Service base URL without trailing path, e.g. `https://router.project-osrm.org`.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL with any trailing slash removed.
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn build_client(&self) -> Result<Client, ProviderBuildError> {
        Ok(Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()?)
    }
}

/// Describe a reqwest failure for logs and error variants.
fn describe(error: &reqwest::Error, url: &str) -> String {
    if error.is_timeout() {
        format!("request to {url} timed out")
    } else if let Some(status) = error.status() {
        format!("HTTP {status} from {url}")
    } else {
        format!("{url}: {error}")
    }
}
