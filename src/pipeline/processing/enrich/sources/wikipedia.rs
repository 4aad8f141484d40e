use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::app::ports::PageFetcherPort;
use crate::constants::WIKIPEDIA_SOURCE;
use crate::error::{PipelineError, Result};
use crate::types::{EnrichmentData, MetadataSource};

use super::{element_text, encode_component};

const API_URL: &str = "https://es.wikipedia.org/w/api.php";
const ARTICLE_URL: &str = "https://es.wikipedia.org/wiki";

static MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*min").unwrap());

/// Spanish-Wikipedia adapter. Finds the article through the search API, then
/// reads the film infobox and the lead paragraph.
pub struct WikipediaSource {
    fetcher: Arc<dyn PageFetcherPort>,
}

impl WikipediaSource {
    pub fn new(fetcher: Arc<dyn PageFetcherPort>) -> Self {
        Self { fetcher }
    }

    fn search_url(canonical_name: &str) -> String {
        let query = format!("\"{}\" película", canonical_name);
        format!(
            "{}?action=query&list=search&srsearch={}&srlimit=1&format=json",
            API_URL,
            encode_component(&query)
        )
    }
}

#[async_trait]
impl MetadataSource for WikipediaSource {
    fn source_name(&self) -> &'static str {
        WIKIPEDIA_SOURCE
    }

    #[instrument(skip(self))]
    async fn lookup(&self, canonical_name: &str) -> Result<EnrichmentData> {
        let search = self
            .fetcher
            .fetch(&Self::search_url(canonical_name))
            .await
            .map_err(|message| PipelineError::Source { message })?;
        let title = match first_search_hit(&search)? {
            Some(title) => title,
            None => {
                debug!("No Wikipedia article for '{}'", canonical_name);
                return Ok(EnrichmentData::default());
            }
        };

        let article_url = format!(
            "{}/{}",
            ARTICLE_URL,
            encode_component(&title.replace(' ', "_"))
        );
        debug!("Fetching Wikipedia article {}", article_url);
        let html = self
            .fetcher
            .fetch(&article_url)
            .await
            .map_err(|message| PipelineError::Source { message })?;
        Ok(parse_article(&html))
    }
}

fn first_search_hit(body: &str) -> Result<Option<String>> {
    let value: Value = serde_json::from_str(body)?;
    Ok(value["query"]["search"][0]["title"]
        .as_str()
        .map(|s| s.to_string()))
}

/// Pulls director, genre, runtime and first credited actor out of the film
/// infobox, plus the first substantial paragraph as the description.
fn parse_article(html: &str) -> EnrichmentData {
    let document = Html::parse_document(html);
    let mut data = EnrichmentData::default();

    let row_selector = Selector::parse("table.infobox tr").unwrap();
    let header_selector = Selector::parse("th").unwrap();
    let value_selector = Selector::parse("td").unwrap();
    let item_selector = Selector::parse("li").unwrap();

    for row in document.select(&row_selector) {
        let header = match row.select(&header_selector).next() {
            Some(header) => header,
            None => continue,
        };
        let value = match row.select(&value_selector).next() {
            Some(value) => value,
            None => continue,
        };
        let label = element_text(&header);

        if label.contains("Dirección") {
            data.director = element_text(&value);
        } else if label.contains("Género") {
            data.categoria = element_text(&value);
        } else if label.contains("Duración") {
            if let Some(captures) = MINUTES.captures(&element_text(&value)) {
                data.duracion = format!("{} minutos", &captures[1]);
            }
        } else if label.contains("Protagonistas") || label.contains("Reparto") {
            data.actor_principal = match value.select(&item_selector).next() {
                Some(item) => element_text(&item),
                None => element_text(&value)
                    .split(',')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string(),
            };
        }
    }

    let paragraph_selector = Selector::parse("div.mw-parser-output > p").unwrap();
    for paragraph in document.select(&paragraph_selector) {
        let text = element_text(&paragraph);
        if text.chars().count() > 40 {
            data.descripcion = text;
            break;
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_FIXTURE: &str = r#"{"query":{"search":[{"title":"Dune: parte dos"}]}}"#;

    const ARTICLE_FIXTURE: &str = r#"
        <html><body>
        <table class="infobox">
          <tr><th>Dirección</th><td>Denis Villeneuve</td></tr>
          <tr><th>Protagonistas</th><td><ul><li>Timothée Chalamet</li><li>Zendaya</li></ul></td></tr>
          <tr><th>Género</th><td>Ciencia ficción</td></tr>
          <tr><th>Duración</th><td>166 minutos (2 h 46 min)</td></tr>
        </table>
        <div class="mw-parser-output">
          <p></p>
          <p>Dune: parte dos es una película épica de ciencia ficción estrenada en 2024.</p>
        </div>
        </body></html>"#;

    struct FixtureFetcher;

    #[async_trait]
    impl PageFetcherPort for FixtureFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, String> {
            if url.contains("api.php") {
                Ok(SEARCH_FIXTURE.to_string())
            } else {
                Ok(ARTICLE_FIXTURE.to_string())
            }
        }

        async fn search(&self, _query: &str) -> std::result::Result<String, String> {
            Err("unused".to_string())
        }
    }

    #[test]
    fn search_url_carries_the_quoted_name() {
        let url = WikipediaSource::search_url("DUNE PARTE DOS");
        assert!(url.starts_with(API_URL));
        assert!(url.contains("srsearch=%22DUNE%20PARTE%20DOS%22%20película"));
        assert!(url.contains("srlimit=1"));
    }

    #[test]
    fn search_hit_is_the_first_title() {
        let hit = first_search_hit(SEARCH_FIXTURE).unwrap();
        assert_eq!(hit.as_deref(), Some("Dune: parte dos"));

        let none = first_search_hit(r#"{"query":{"search":[]}}"#).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn malformed_search_body_is_an_error() {
        assert!(first_search_hit("<html>rate limited</html>").is_err());
    }

    #[test]
    fn infobox_fields_are_extracted() {
        let data = parse_article(ARTICLE_FIXTURE);
        assert_eq!(data.director, "Denis Villeneuve");
        assert_eq!(data.actor_principal, "Timothée Chalamet");
        assert_eq!(data.categoria, "Ciencia ficción");
        assert_eq!(data.duracion, "166 minutos");
        assert!(data.descripcion.starts_with("Dune: parte dos es una película"));
    }

    #[tokio::test]
    async fn lookup_chains_search_and_article() {
        let source = WikipediaSource::new(Arc::new(FixtureFetcher));
        let data = source.lookup("DUNE PARTE DOS").await.unwrap();
        assert_eq!(data.director, "Denis Villeneuve");
        assert_eq!(data.duracion, "166 minutos");
    }
}
