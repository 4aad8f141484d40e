use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::ports::PageFetcherPort;
use crate::error::Result;

/// Some of the consulted sites answer a default reqwest agent with an empty
/// shell page, so the shared client identifies as a desktop browser.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Endpoint backing `search`. The HTML-only variant answers plain GET
/// requests without scripting.
const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// reqwest-backed page fetcher shared by every enrichment source. One client,
/// one connection pool, one timeout.
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcherPort for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!(
                "request failed with status {} for {}",
                response.status(),
                url
            ));
        }

        response.text().await.map_err(|e| e.to_string())
    }

    async fn search(&self, query: &str) -> std::result::Result<String, String> {
        let encoded = query.replace('"', "%22").replace(' ', "%20");
        self.fetch(&format!("{}?q={}", SEARCH_URL, encoded)).await
    }
}
