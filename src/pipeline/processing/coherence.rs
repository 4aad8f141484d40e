use std::collections::HashMap;

use crate::pipeline::processing::catalog::CatalogIndex;
use crate::types::MovieRow;

type FieldGet = fn(&MovieRow) -> &str;
type FieldSet = fn(&mut MovieRow, String);

/// The coherent-set fields: every record of a canonical-key group must end up
/// carrying the same value for each of these.
fn coherent_fields() -> [(FieldGet, FieldSet); 6] {
    [
        (|r| r.categoria.as_str(), |r, v| r.categoria = v),
        (|r| r.descripcion.as_str(), |r, v| r.descripcion = v),
        (|r| r.actor_principal.as_str(), |r, v| r.actor_principal = v),
        (|r| r.director.as_str(), |r, v| r.director = v),
        (|r| r.duracion.as_str(), |r, v| r.duracion = v),
        (|r| r.familia.as_str(), |r, v| r.familia = v),
    ]
}

/// Counters describing one propagation sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropagationStats {
    pub groups: usize,
    pub fields_filled: usize,
    pub mirrors_fixed: usize,
}

/// Forces within-group agreement on metadata (vertical coherence) and
/// field-pair equality inside each row (horizontal coherence).
///
/// Vertical: per group and field, the modal non-empty value (ties broken by
/// first occurrence) fills every empty slot. Existing non-empty values are
/// left alone on this pass; the validator reports any residual divergence.
/// One counting sweep plus one fill sweep per field keeps it O(group size).
#[derive(Debug, Clone, Default)]
pub struct CoherencePropagator;

impl CoherencePropagator {
    pub fn new() -> Self {
        Self
    }

    pub fn propagate(&self, rows: &mut [MovieRow]) -> PropagationStats {
        let groups = group_indices(rows);
        let mut stats = PropagationStats {
            groups: groups.len(),
            ..Default::default()
        };

        for indices in groups.values() {
            for (get, set) in coherent_fields() {
                stats.fields_filled += propagate_field(rows, indices, get, set);
            }
        }

        for row in rows.iter_mut() {
            stats.mirrors_fixed += enforce_mirrors(row);
        }

        stats
    }

    /// Re-asserts horizontal mirrors on every row. Called whenever a primary
    /// field may have changed behind its mirror's back.
    pub fn assert_mirrors(&self, rows: &mut [MovieRow]) -> usize {
        rows.iter_mut().map(enforce_mirrors).sum()
    }

    /// Writes catalog metadata into every member row (empty slots only), then
    /// re-asserts the mirrors. Used after enrichment has filled the catalog.
    pub fn apply_catalog(&self, rows: &mut [MovieRow], catalog: &CatalogIndex) -> usize {
        let mut filled = 0;
        for row in rows.iter_mut() {
            if let Some(movie) = catalog.get(&row.nombre_unico) {
                let metadata = &movie.metadata;
                filled += fill_if_empty(&mut row.categoria, &metadata.categoria);
                filled += fill_if_empty(&mut row.descripcion, &metadata.descripcion);
                filled += fill_if_empty(&mut row.actor_principal, &metadata.actor_principal);
                filled += fill_if_empty(&mut row.director, &metadata.director);
                filled += fill_if_empty(&mut row.duracion, &metadata.duracion);
                filled += fill_if_empty(&mut row.familia, &movie.family_key);
            }
            enforce_mirrors(row);
        }
        filled
    }
}

/// Row indices per canonical key. Records without a key are not a group:
/// they are distinct unknown movies and must not share metadata.
fn group_indices(rows: &[MovieRow]) -> HashMap<String, Vec<usize>> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        if row.nombre_unico.is_empty() {
            continue;
        }
        groups.entry(row.nombre_unico.clone()).or_default().push(index);
    }
    groups
}

fn propagate_field(
    rows: &mut [MovieRow],
    indices: &[usize],
    get: FieldGet,
    set: FieldSet,
) -> usize {
    // elect the modal non-empty value, ties broken by first occurrence
    let elected: Option<String> = {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, &index) in indices.iter().enumerate() {
            let value = get(&rows[index]);
            if value.is_empty() {
                continue;
            }
            counts.entry(value).or_insert((0, position)).0 += 1;
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
            .map(|(value, _)| value.to_string())
    };

    let Some(elected) = elected else {
        return 0;
    };

    let mut filled = 0;
    for &index in indices {
        if get(&rows[index]).is_empty() {
            set(&mut rows[index], elected.clone());
            filled += 1;
        }
    }
    filled
}

fn fill_if_empty(slot: &mut String, value: &str) -> usize {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
        1
    } else {
        0
    }
}

/// Horizontal coherence for one row. The mirrors are unconditional; FAMILIA
/// falls back to the first word of the canonical key when nothing better is
/// known.
fn enforce_mirrors(row: &mut MovieRow) -> usize {
    let mut fixed = 0;
    if row.categoria_cinepolis != row.categoria {
        row.categoria_cinepolis = row.categoria.clone();
        fixed += 1;
    }
    if row.descripcion2 != row.descripcion {
        row.descripcion2 = row.descripcion.clone();
        fixed += 1;
    }
    if row.titulo_limpio_clean != row.nombre_original_clean {
        row.titulo_limpio_clean = row.nombre_original_clean.clone();
        fixed += 1;
    }
    if row.familia.is_empty() {
        if let Some(first_word) = row.nombre_unico.split_whitespace().next() {
            row.familia = first_word.to_string();
            fixed += 1;
        }
    }
    fixed
}
