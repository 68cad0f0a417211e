//! Connection settings for the API client.

use std::fmt;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://lichess.org";

/// Where to reach the platform and how to authenticate.
#[derive(Clone)]
pub struct ApiConfig {
    /// Personal API token, sent as a bearer credential on every request.
    pub token: String,
    /// Root URL of the platform; endpoint paths are joined onto it.
    pub base_url: Url,
}

impl ApiConfig {
    pub fn new(token: impl Into<String>, base_url: Url) -> Self {
        Self {
            token: token.into(),
            base_url,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
