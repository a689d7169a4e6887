//! reqwest-backed fetcher: `GET {base_url}/{id}`.

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::model::ItemId;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::trace;

/// Default endpoint serving the photo collection.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/photos";

/// HTTP fetcher sharing one connection pool across all attempts.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<SecretString>,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("photofetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_api_token(mut self, token: SecretString) -> Self {
        self.api_token = Some(token);
        self
    }

    pub fn endpoint(&self, id: ItemId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: ItemId, deadline: Duration) -> Result<Vec<u8>> {
        let endpoint = self.endpoint(id);
        trace!(%endpoint, "fetching");

        let mut request = self.client.get(&endpoint).timeout(deadline);
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Transport(format!("{endpoint} returned {status}")));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_id() {
        let fetcher = HttpFetcher::new("http://localhost:8080/photos/").unwrap();
        assert_eq!(fetcher.endpoint(ItemId(42)), "http://localhost:8080/photos/42");
    }
}
