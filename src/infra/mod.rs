// Adapters behind the app ports: HTTP page fetching, NDJSON table IO, and
// the enrichment cache file.

pub mod cache;
pub mod http_client;
pub mod ndjson_store;
