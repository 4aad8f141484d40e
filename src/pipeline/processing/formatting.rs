use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{CATEGORY_MAPPING, CATEGORY_PRIORITIES, DEFAULT_CATEGORY};
use crate::types::MovieRow;

static CATEGORY_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;\s/]+").unwrap());
static PERSON_COUNT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+\s*personas?").unwrap());
static TRAILING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s*$").unwrap());
static ANY_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Maps free-form category text onto the controlled single-token vocabulary.
/// Direct hits map straight through; multi-word text resolves by priority,
/// then by the first plausible word; everything else lands on the default.
pub fn normalize_category(raw: &str) -> String {
    let text = raw.trim().to_uppercase();
    if text.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }

    if let Some(mapped) = lookup_category(&text) {
        return mapped.to_string();
    }

    let words: Vec<&str> = CATEGORY_SPLIT
        .split(&text)
        .filter(|word| !word.is_empty())
        .collect();

    for priority in CATEGORY_PRIORITIES {
        for word in &words {
            if lookup_category(word) == Some(priority) {
                return priority.to_string();
            }
        }
    }
    for word in &words {
        if let Some(mapped) = lookup_category(word) {
            return mapped.to_string();
        }
    }

    // last resort: first alphabetic word of a sane length
    for word in &words {
        if word.len() > 2 && word.chars().all(|c| c.is_alphabetic()) {
            return word.chars().take(12).collect();
        }
    }

    DEFAULT_CATEGORY.to_string()
}

fn lookup_category(word: &str) -> Option<&'static str> {
    CATEGORY_MAPPING
        .iter()
        .find(|(raw, _)| *raw == word)
        .map(|(_, token)| *token)
}

/// Title-cases a person name ("denis VILLENEUVE" becomes "Denis Villeneuve").
pub fn title_case_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops scrape artifacts from the lead-actor field: "3 personas" style
/// prefixes and dangling counts.
pub fn clean_actor_field(actor: &str) -> String {
    let cleaned = PERSON_COUNT_PREFIX.replace(actor.trim(), "");
    TRAILING_DIGITS.replace(&cleaned, "").trim().to_string()
}

/// Capital first letter and a closing period for the synopsis.
pub fn polish_description(description: &str) -> String {
    let text = description.trim();
    if text.is_empty() {
        return String::new();
    }
    let mut chars = text.chars();
    let mut polished = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    if !polished.ends_with('.') && !polished.ends_with('!') && !polished.ends_with('?') {
        polished.push('.');
    }
    polished
}

/// "<N> minutos" from whatever the duration field holds; text without a
/// number passes through unchanged.
pub fn standardize_duration(duration: &str) -> String {
    let text = duration.trim();
    if text.is_empty() {
        return String::new();
    }
    match ANY_NUMBER.find(text) {
        Some(found) => format!("{} minutos", found.as_str()),
        None => text.to_string(),
    }
}

/// The presentation pass over the final table. Mirrors must be re-asserted
/// afterwards since CATEGORIA and DESCRIPCION may change here.
pub fn apply(rows: &mut [MovieRow]) {
    for row in rows.iter_mut() {
        row.categoria = normalize_category(&row.categoria);
        row.director = title_case_name(&row.director);
        row.actor_principal = title_case_name(&clean_actor_field(&row.actor_principal));
        row.descripcion = polish_description(&row.descripcion);
        row.duracion = standardize_duration(&row.duracion);
        row.formato = row.formato.to_uppercase();
        row.idioma = row.idioma.to_uppercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_category_hits_map_through() {
        assert_eq!(normalize_category("Acción"), "ACCION");
        assert_eq!(normalize_category("horror"), "TERROR");
        assert_eq!(normalize_category("BIOGRAFÍA"), "DRAMA");
        assert_eq!(normalize_category("CIENCIA"), "CIENCIA_FICCION");
    }

    #[test]
    fn multi_word_categories_resolve_by_priority() {
        assert_eq!(normalize_category("Drama, Acción"), "ACCION");
        assert_eq!(normalize_category("Comedia / Romance"), "COMEDIA");
        assert_eq!(normalize_category("Romance; Musical"), "ROMANCE");
    }

    #[test]
    fn unknown_text_falls_back_sensibly() {
        assert_eq!(normalize_category(""), "DRAMA");
        assert_eq!(normalize_category("???"), "DRAMA");
        assert_eq!(normalize_category("WESTERN"), "WESTERN");
        // single tokens only, truncated to a sane length
        assert!(!normalize_category("EXPERIMENTALISIMO").contains(' '));
        assert!(normalize_category("EXPERIMENTALISIMO").len() <= 12);
    }

    #[test]
    fn names_are_title_cased() {
        assert_eq!(title_case_name("denis VILLENEUVE"), "Denis Villeneuve");
        assert_eq!(title_case_name(""), "");
    }

    #[test]
    fn actor_artifacts_are_removed() {
        assert_eq!(clean_actor_field("3 personas"), "");
        assert_eq!(clean_actor_field("4 Personas Timothee Chalamet"), "Timothee Chalamet");
        assert_eq!(clean_actor_field("Zendaya 2"), "Zendaya");
    }

    #[test]
    fn descriptions_get_capital_and_period() {
        assert_eq!(polish_description("una historia de arena"), "Una historia de arena.");
        assert_eq!(polish_description("¿Quién vive?"), "¿Quién vive?");
        assert_eq!(polish_description(""), "");
    }

    #[test]
    fn durations_standardize_to_minutos() {
        assert_eq!(standardize_duration("166"), "166 minutos");
        assert_eq!(standardize_duration("166 min"), "166 minutos");
        assert_eq!(standardize_duration("166 minutos"), "166 minutos");
        assert_eq!(standardize_duration(""), "");
    }

    #[test]
    fn apply_formats_whole_rows() {
        let mut rows = vec![MovieRow {
            categoria: "Acción, Drama".to_string(),
            director: "denis villeneuve".to_string(),
            actor_principal: "5 personas timothee chalamet".to_string(),
            descripcion: "arena y especia".to_string(),
            duracion: "166 min".to_string(),
            formato: "4d".to_string(),
            idioma: "sub".to_string(),
            ..Default::default()
        }];
        apply(&mut rows);
        let row = &rows[0];
        assert_eq!(row.categoria, "ACCION");
        assert_eq!(row.director, "Denis Villeneuve");
        assert_eq!(row.actor_principal, "Timothee Chalamet");
        assert_eq!(row.descripcion, "Arena y especia.");
        assert_eq!(row.duracion, "166 minutos");
        assert_eq!(row.formato, "4D");
        assert_eq!(row.idioma, "SUB");
    }
}
