mod cinepolis;
mod imdb;
mod wikipedia;

pub use cinepolis::CinepolisSource;
pub use imdb::ImdbSource;
pub use wikipedia::WikipediaSource;

use std::sync::Arc;

use scraper::{ElementRef, Html};
use tracing::warn;

use crate::app::ports::PageFetcherPort;
use crate::constants::{CINEPOLIS_SOURCE, IMDB_SOURCE, WIKIPEDIA_SOURCE};
use crate::types::MetadataSource;

/// Builds the adapter list from configured names, preserving priority order.
/// Unknown names are skipped with a warning instead of aborting the run.
pub fn sources_from_config(
    names: &[String],
    fetcher: &Arc<dyn PageFetcherPort>,
) -> Vec<Arc<dyn MetadataSource>> {
    let mut sources: Vec<Arc<dyn MetadataSource>> = Vec::new();
    for name in names {
        match name.as_str() {
            CINEPOLIS_SOURCE => sources.push(Arc::new(CinepolisSource::new(Arc::clone(fetcher)))),
            WIKIPEDIA_SOURCE => sources.push(Arc::new(WikipediaSource::new(Arc::clone(fetcher)))),
            IMDB_SOURCE => sources.push(Arc::new(ImdbSource::new(Arc::clone(fetcher)))),
            other => warn!("Unknown enrichment source '{}' in config, skipping", other),
        }
    }
    sources
}

/// Visible text of a whole page, whitespace collapsed to single spaces.
pub(crate) fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let joined = document.root_element().text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of one element, whitespace collapsed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Minimal query-string escaping for movie names: spaces and quotes. The URL
/// parser percent-encodes any remaining non-ASCII on its own.
pub(crate) fn encode_component(value: &str) -> String {
    value.replace('"', "%22").replace(' ', "%20")
}
