use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use crate::app::ports::PageFetcherPort;
use crate::constants::CINEPOLIS_SOURCE;
use crate::error::{PipelineError, Result};
use crate::types::{EnrichmentData, MetadataSource};

use super::page_text;

const BASE_URL: &str = "https://cinepolischile.cl/pelicula";

static DURATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2,3})\s*min").unwrap());
static CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Categoría[:\s]*([^.\n]+?)\s*(?:Califica|Sinopsis|$)").unwrap());
static SYNOPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Sinopsis[:\s]*([^.]+\.)").unwrap());
static ACTORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Actores?[:\s]*([^.\n]+?)\s*(?:Director|$)").unwrap());
static DIRECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Director(?:es)?[:\s]*([^.\n]+?)\s*(?:Reparto|$)").unwrap());

/// Chain-site adapter. The movie page is addressed by a slug derived from the
/// canonical name; its flattened text carries labelled sections for all five
/// metadata fields.
pub struct CinepolisSource {
    fetcher: Arc<dyn PageFetcherPort>,
}

impl CinepolisSource {
    pub fn new(fetcher: Arc<dyn PageFetcherPort>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl MetadataSource for CinepolisSource {
    fn source_name(&self) -> &'static str {
        CINEPOLIS_SOURCE
    }

    #[instrument(skip(self))]
    async fn lookup(&self, canonical_name: &str) -> Result<EnrichmentData> {
        let url = format!("{}/{}", BASE_URL, slug(canonical_name));
        debug!("Fetching Cinépolis page {}", url);
        let html = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|message| PipelineError::Source { message })?;
        let text = page_text(&html);

        let mut data = EnrichmentData::default();
        if let Some(captures) = DURATION.captures(&text) {
            data.duracion = format!("{} minutos", &captures[1]);
        }
        if let Some(captures) = CATEGORY.captures(&text) {
            data.categoria = captures[1].trim().to_string();
        }
        if let Some(captures) = SYNOPSIS.captures(&text) {
            data.descripcion = captures[1].trim().to_string();
        }
        if let Some(captures) = ACTORS.captures(&text) {
            data.actor_principal = captures[1].trim().to_string();
        }
        if let Some(captures) = DIRECTOR.captures(&text) {
            data.director = captures[1].trim().to_string();
        }
        Ok(data)
    }
}

/// URL slug for a canonical name: lowercase, accents folded to ASCII, runs of
/// anything else collapsed to single dashes.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.to_lowercase().chars() {
        let folded = match ch {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        };
        if folded.is_ascii_alphanumeric() {
            out.push(folded);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixtureFetcher {
        body: &'static str,
    }

    #[async_trait]
    impl PageFetcherPort for FixtureFetcher {
        async fn fetch(&self, _url: &str) -> std::result::Result<String, String> {
            Ok(self.body.to_string())
        }

        async fn search(&self, _query: &str) -> std::result::Result<String, String> {
            Err("unused".to_string())
        }
    }

    #[test]
    fn slugs_fold_accents_and_punctuation() {
        assert_eq!(slug("DUNE PARTE DOS"), "dune-parte-dos");
        assert_eq!(slug("MISIÓN IMPOSIBLE"), "mision-imposible");
        assert_eq!(slug("EL NIÑO Y LA GARZA"), "el-nino-y-la-garza");
        assert_eq!(slug("  WICKED  "), "wicked");
    }

    #[test]
    fn category_capture_stops_at_the_next_section() {
        let text = "Categoría: Acción Califica la película";
        let captures = CATEGORY.captures(text).unwrap();
        assert_eq!(&captures[1], "Acción");
    }

    #[test]
    fn synopsis_capture_ends_at_the_first_period() {
        let text = "Sinopsis: Paul Atreides se une a los Fremen. Comparte esta página";
        let captures = SYNOPSIS.captures(text).unwrap();
        assert_eq!(&captures[1], "Paul Atreides se une a los Fremen.");
    }

    #[test]
    fn credit_captures_stop_at_the_next_label() {
        let text = "Actores: Timothée Chalamet, Zendaya Director: Denis Villeneuve Reparto";
        assert_eq!(
            &ACTORS.captures(text).unwrap()[1],
            "Timothée Chalamet, Zendaya"
        );
        assert_eq!(&DIRECTOR.captures(text).unwrap()[1], "Denis Villeneuve");
    }

    #[tokio::test]
    async fn lookup_extracts_all_five_fields() {
        let fetcher = Arc::new(FixtureFetcher {
            body: "<html><body><h1>Dune Parte Dos</h1>\
                   <p>Categoría: Ciencia Ficción Califica</p>\
                   <span>166 min</span>\
                   <p>Sinopsis: Paul Atreides se une a los Fremen para vengar a su familia.</p>\
                   <p>Actores: Timothée Chalamet, Zendaya Director: Denis Villeneuve Reparto</p>\
                   </body></html>",
        });
        let source = CinepolisSource::new(fetcher);

        let data = source.lookup("DUNE PARTE DOS").await.unwrap();
        assert_eq!(data.duracion, "166 minutos");
        assert_eq!(data.categoria, "Ciencia Ficción");
        assert_eq!(
            data.descripcion,
            "Paul Atreides se une a los Fremen para vengar a su familia."
        );
        assert_eq!(data.actor_principal, "Timothée Chalamet, Zendaya");
        assert_eq!(data.director, "Denis Villeneuve");
        assert!(data.is_complete());
    }
}
