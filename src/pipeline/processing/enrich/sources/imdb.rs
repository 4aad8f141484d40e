use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::app::ports::PageFetcherPort;
use crate::constants::IMDB_SOURCE;
use crate::error::{PipelineError, Result};
use crate::types::{EnrichmentData, MetadataSource};

static TITLE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"imdb\.com/title/(tt\d+)").unwrap());
static ISO_DURATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?").unwrap());

/// IMDb adapter. A web search scoped to imdb.com locates the title page,
/// whose JSON-LD block carries everything we need in one parse.
pub struct ImdbSource {
    fetcher: Arc<dyn PageFetcherPort>,
}

impl ImdbSource {
    pub fn new(fetcher: Arc<dyn PageFetcherPort>) -> Self {
        Self { fetcher }
    }

    fn search_query(canonical_name: &str) -> String {
        format!("{} site:imdb.com", canonical_name)
    }
}

#[async_trait]
impl MetadataSource for ImdbSource {
    fn source_name(&self) -> &'static str {
        IMDB_SOURCE
    }

    #[instrument(skip(self))]
    async fn lookup(&self, canonical_name: &str) -> Result<EnrichmentData> {
        let search_page = self
            .fetcher
            .search(&Self::search_query(canonical_name))
            .await
            .map_err(|message| PipelineError::Source { message })?;
        let title_id = match first_title_id(&search_page) {
            Some(id) => id,
            None => {
                debug!("No IMDb result for '{}'", canonical_name);
                return Ok(EnrichmentData::default());
            }
        };

        let title_url = format!("https://www.imdb.com/title/{}/", title_id);
        debug!("Fetching IMDb title page {}", title_url);
        let html = self
            .fetcher
            .fetch(&title_url)
            .await
            .map_err(|message| PipelineError::Source { message })?;
        parse_title_page(&html)
    }
}

fn first_title_id(html: &str) -> Option<String> {
    TITLE_LINK.captures(html).map(|captures| captures[1].to_string())
}

/// "PT2H46M" style ISO durations to "166 minutos".
fn parse_iso_duration(value: &str) -> Option<String> {
    let captures = ISO_DURATION.captures(value)?;
    let hours: u32 = captures
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let minutes: u32 = captures
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let total = hours * 60 + minutes;
    if total == 0 {
        None
    } else {
        Some(format!("{} minutos", total))
    }
}

/// Director and actor come as either a single credit object or an array of
/// them; either way the first name wins.
fn person_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => value["name"].as_str().map(|s| s.to_string()),
        Value::Array(items) => items.first().and_then(person_name),
        _ => None,
    }
}

fn parse_title_page(html: &str) -> Result<EnrichmentData> {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    let script = match document.select(&script_selector).next() {
        Some(node) => node.inner_html(),
        None => {
            debug!("IMDb title page carries no JSON-LD block");
            return Ok(EnrichmentData::default());
        }
    };
    let json: Value = serde_json::from_str(&script)?;

    let mut data = EnrichmentData::default();
    data.categoria = match &json["genre"] {
        Value::String(genre) => genre.clone(),
        Value::Array(genres) => genres
            .iter()
            .filter_map(|genre| genre.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    };
    if let Some(description) = json["description"].as_str() {
        data.descripcion = description.to_string();
    }
    if let Some(director) = person_name(&json["director"]) {
        data.director = director;
    }
    if let Some(actor) = person_name(&json["actor"]) {
        data.actor_principal = actor;
    }
    if let Some(duration) = json["duration"].as_str().and_then(parse_iso_duration) {
        data.duracion = duration;
    }
    Ok(data)
}
