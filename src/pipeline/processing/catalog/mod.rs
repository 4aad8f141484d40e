use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::pipeline::processing::normalize::NormalizedRecord;
use crate::types::{EnrichmentData, MovieRow};

/// One entry per distinct canonical key. The catalog owns these; records only
/// ever hold the movie_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMovie {
    /// Stable positive identity, assigned once per run, never reused.
    pub movie_id: u64,
    pub canonical_key: String,
    pub family_key: String,
    /// Enrichable metadata. Fields move empty to non-empty only; propagation
    /// and enrichment are the sole writers after the scan seed.
    pub metadata: EnrichmentData,
}

/// Outcome of resolving one record's canonical key against the built catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// The key was present in the pass-1 catalog.
    MatchedExisting(u64),
    /// The key was not in the catalog (incremental data merged against an
    /// older build); a fresh trailing identity was allocated.
    AllocatedNew(u64),
    /// The record has no usable name. Empty keys never enter the catalog and
    /// always receive fresh trailing identities.
    EmptyKey(u64),
}

impl KeyResolution {
    pub fn movie_id(&self) -> u64 {
        match self {
            KeyResolution::MatchedExisting(id)
            | KeyResolution::AllocatedNew(id)
            | KeyResolution::EmptyKey(id) => *id,
        }
    }
}

/// Registry mapping canonical key to stable numeric identity.
///
/// Construction is two-pass: `build` scans every record and allocates IDs in
/// ascending first-occurrence order (pass 1), and only a fully built catalog
/// can resolve records (pass 2). That ordering is what makes chunk-level
/// parallelism safe: nothing reads the catalog while it is half-built.
pub struct CatalogIndex {
    movies: HashMap<String, CanonicalMovie>,
    next_id: u64,
}

impl CatalogIndex {
    /// Pass 1: scan the full record stream and seed one CanonicalMovie per
    /// distinct non-empty canonical key, IDs ascending from 1 in
    /// first-occurrence order.
    pub fn build(records: &[NormalizedRecord]) -> Self {
        let mut catalog = Self {
            movies: HashMap::new(),
            next_id: 1,
        };

        for record in records {
            if record.canonical_key.is_empty() {
                continue;
            }
            if !catalog.movies.contains_key(&record.canonical_key) {
                let movie_id = catalog.next_id;
                catalog.next_id += 1;
                let mut metadata = EnrichmentData::default();
                if let Some(minutes) = record.duration_minutes {
                    metadata.duracion = format!("{} minutos", minutes);
                }
                catalog.movies.insert(
                    record.canonical_key.clone(),
                    CanonicalMovie {
                        movie_id,
                        canonical_key: record.canonical_key.clone(),
                        family_key: record.family_key.clone(),
                        metadata,
                    },
                );
            }
        }

        catalog
    }

    /// Rebuilds a catalog from an already standardized table, keeping the IDs
    /// the rows carry. Metadata is seeded from the first row of each group, so
    /// propagation should run before this when the table may be incoherent.
    pub fn from_rows(rows: &[MovieRow]) -> Self {
        let mut catalog = Self {
            movies: HashMap::new(),
            next_id: 1,
        };

        for row in rows {
            catalog.next_id = catalog.next_id.max(row.movie_id + 1);
            if row.nombre_unico.is_empty() {
                continue;
            }
            catalog
                .movies
                .entry(row.nombre_unico.clone())
                .or_insert_with(|| CanonicalMovie {
                    movie_id: row.movie_id,
                    canonical_key: row.nombre_unico.clone(),
                    family_key: row.familia.clone(),
                    metadata: EnrichmentData {
                        categoria: row.categoria.clone(),
                        descripcion: row.descripcion.clone(),
                        actor_principal: row.actor_principal.clone(),
                        director: row.director.clone(),
                        duracion: row.duracion.clone(),
                    },
                });
        }

        catalog
    }

    /// Pass 2: resolve one record against the built catalog. Unseen non-empty
    /// keys are appended with trailing IDs rather than rejected, so new data
    /// can be merged against an old catalog.
    pub fn assign(&mut self, record: &NormalizedRecord) -> KeyResolution {
        if record.canonical_key.is_empty() {
            return KeyResolution::EmptyKey(self.allocate_trailing());
        }
        if let Some(movie) = self.movies.get(&record.canonical_key) {
            return KeyResolution::MatchedExisting(movie.movie_id);
        }

        let movie_id = self.allocate_trailing();
        let mut metadata = EnrichmentData::default();
        if let Some(minutes) = record.duration_minutes {
            metadata.duracion = format!("{} minutos", minutes);
        }
        self.movies.insert(
            record.canonical_key.clone(),
            CanonicalMovie {
                movie_id,
                canonical_key: record.canonical_key.clone(),
                family_key: record.family_key.clone(),
                metadata,
            },
        );
        KeyResolution::AllocatedNew(movie_id)
    }

    /// Next unused ID after everything allocated so far. Never 0.
    fn allocate_trailing(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, canonical_key: &str) -> Option<&CanonicalMovie> {
        self.movies.get(canonical_key)
    }

    pub fn get_mut(&mut self, canonical_key: &str) -> Option<&mut CanonicalMovie> {
        self.movies.get_mut(canonical_key)
    }

    pub fn movies(&self) -> impl Iterator<Item = &CanonicalMovie> {
        self.movies.values()
    }

    /// Canonical keys whose metadata still misses at least one target field,
    /// in ascending movie_id order so runs are reproducible.
    pub fn incomplete_keys(&self) -> Vec<String> {
        let mut movies: Vec<&CanonicalMovie> = self
            .movies
            .values()
            .filter(|movie| !movie.metadata.is_complete())
            .collect();
        movies.sort_by_key(|movie| movie.movie_id);
        movies
            .into_iter()
            .map(|movie| movie.canonical_key.clone())
            .collect()
    }
}

/// Corrective re-indexing over a finalized table: MOVIE_ID becomes the
/// 1-based rank of NOMBRE_UNICO among the sorted distinct keys, and rows
/// without a key take fresh trailing IDs. Restores the key/ID bijection no
/// matter what earlier stages produced.
pub fn reindex_rows(rows: &mut [MovieRow]) -> usize {
    let distinct: BTreeSet<&str> = rows
        .iter()
        .filter(|row| !row.nombre_unico.is_empty())
        .map(|row| row.nombre_unico.as_str())
        .collect();

    let rank: HashMap<String, u64> = distinct
        .into_iter()
        .enumerate()
        .map(|(index, key)| (key.to_string(), index as u64 + 1))
        .collect();

    let mut trailing = rank.len() as u64;
    let mut changed = 0;
    for row in rows.iter_mut() {
        let new_id = match rank.get(&row.nombre_unico) {
            Some(id) => *id,
            None => {
                trailing += 1;
                trailing
            }
        };
        if row.movie_id != new_id {
            row.movie_id = new_id;
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::attributes::AttributeExtractor;
    use crate::pipeline::processing::normalize::{DefaultNormalizer, Normalizer};
    use crate::types::RawRecord;

    fn normalized(name: &str) -> NormalizedRecord {
        let normalizer = DefaultNormalizer::new(AttributeExtractor::default());
        normalizer.normalize(&RawRecord {
            movie_name: name.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn build_allocates_first_occurrence_order_from_one() {
        let records = vec![
            normalized("ZORRO"),
            normalized("BARBIE"),
            normalized("ZORRO SUB"),
            normalized("AVATAR"),
        ];
        let catalog = CatalogIndex::build(&records);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("ZORRO").unwrap().movie_id, 1);
        assert_eq!(catalog.get("BARBIE").unwrap().movie_id, 2);
        assert_eq!(catalog.get("AVATAR").unwrap().movie_id, 3);
    }

    #[test]
    fn suffix_variants_resolve_to_one_identity() {
        let records = vec![
            normalized("DUNE PARTE DOS 4DX SUB"),
            normalized("DUNE PARTE DOS ESP"),
        ];
        let mut catalog = CatalogIndex::build(&records);
        let first = catalog.assign(&records[0]);
        let second = catalog.assign(&records[1]);
        assert_eq!(first, KeyResolution::MatchedExisting(1));
        assert_eq!(second, KeyResolution::MatchedExisting(1));
    }

    #[test]
    fn empty_keys_stay_out_of_the_catalog_and_get_trailing_ids() {
        let records = vec![normalized("BARBIE"), normalized(""), normalized("")];
        let mut catalog = CatalogIndex::build(&records);
        assert_eq!(catalog.len(), 1);

        let a = catalog.assign(&records[1]);
        let b = catalog.assign(&records[2]);
        assert_eq!(a, KeyResolution::EmptyKey(2));
        assert_eq!(b, KeyResolution::EmptyKey(3));
        // the empty key still is not a catalog entry
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn unseen_key_in_second_pass_appends_a_trailing_id() {
        let records = vec![normalized("BARBIE"), normalized("AVATAR")];
        let mut catalog = CatalogIndex::build(&records);

        let late = normalized("WICKED");
        assert_eq!(catalog.assign(&late), KeyResolution::AllocatedNew(3));
        // and it is now a regular member
        assert_eq!(catalog.assign(&late), KeyResolution::MatchedExisting(3));
    }

    #[test]
    fn build_seeds_duration_from_first_occurrence() {
        let normalizer = DefaultNormalizer::new(AttributeExtractor::default());
        let record = normalizer.normalize(&RawRecord {
            movie_name: "OPPENHEIMER IMAX".to_string(),
            movie_duration: Some("180 min".to_string()),
            ..Default::default()
        });
        let catalog = CatalogIndex::build(&[record]);
        assert_eq!(
            catalog.get("OPPENHEIMER").unwrap().metadata.duracion,
            "180 minutos"
        );
    }

    #[test]
    fn incomplete_keys_orders_by_movie_id() {
        let records = vec![normalized("ZORRO"), normalized("BARBIE")];
        let catalog = CatalogIndex::build(&records);
        assert_eq!(catalog.incomplete_keys(), vec!["ZORRO", "BARBIE"]);
    }

    #[test]
    fn from_rows_keeps_existing_ids_and_metadata() {
        let rows = vec![
            MovieRow {
                movie_id: 3,
                nombre_unico: "DUNE PARTE DOS".to_string(),
                familia: "DUNE".to_string(),
                director: "Denis Villeneuve".to_string(),
                ..Default::default()
            },
            MovieRow {
                movie_id: 3,
                nombre_unico: "DUNE PARTE DOS".to_string(),
                ..Default::default()
            },
            MovieRow {
                movie_id: 7,
                nombre_unico: "BARBIE".to_string(),
                ..Default::default()
            },
        ];
        let mut catalog = CatalogIndex::from_rows(&rows);
        assert_eq!(catalog.len(), 2);
        let dune = catalog.get("DUNE PARTE DOS").unwrap();
        assert_eq!(dune.movie_id, 3);
        assert_eq!(dune.family_key, "DUNE");
        assert_eq!(dune.metadata.director, "Denis Villeneuve");

        // trailing allocation continues after the highest seen id
        let late = normalized("WICKED");
        assert_eq!(catalog.assign(&late), KeyResolution::AllocatedNew(8));
    }

    #[test]
    fn reindex_assigns_lexicographic_ranks() {
        let mut rows = vec![
            MovieRow {
                movie_id: 9,
                nombre_unico: "ZORRO".to_string(),
                ..Default::default()
            },
            MovieRow {
                movie_id: 9,
                nombre_unico: "AVATAR".to_string(),
                ..Default::default()
            },
            MovieRow {
                movie_id: 1,
                nombre_unico: "ZORRO".to_string(),
                ..Default::default()
            },
            MovieRow {
                movie_id: 4,
                nombre_unico: String::new(),
                ..Default::default()
            },
        ];
        let changed = reindex_rows(&mut rows);
        assert_eq!(rows[0].movie_id, 2);
        assert_eq!(rows[1].movie_id, 1);
        assert_eq!(rows[2].movie_id, 2);
        // empty key gets a trailing id after both real keys
        assert_eq!(rows[3].movie_id, 3);
        assert_eq!(changed, 4);
    }
}
