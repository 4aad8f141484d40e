use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::ESP_FALSE_POSITIVES;
use crate::types::MovieRow;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Outcome of running the full check battery over a finished dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// True only when every check passed.
    pub certified: bool,
    /// Share of passed checks, 0.0 to 100.0.
    pub score: f64,
    /// Number of rows the battery ran over.
    pub rows_validated: usize,
    /// Individual check results, in battery order.
    pub checks: Vec<QualityCheck>,
    /// The check battery version used.
    pub rule_version: String,
    /// When this validation was performed.
    pub validated_at: DateTime<Utc>,
}

impl QualityReport {
    /// Whether a specific check failed.
    pub fn failed(&self, kind: QualityCheckKind) -> bool {
        self.checks.iter().any(|c| c.kind == kind && !c.passed)
    }

    /// Kinds of every failed check, in battery order.
    pub fn failed_kinds(&self) -> Vec<QualityCheckKind> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.kind)
            .collect()
    }
}

/// One named check with its verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheck {
    /// Which check this is.
    pub kind: QualityCheckKind,
    /// How bad a failure of this check is.
    pub severity: QualitySeverity,
    /// Whether the dataset passed it.
    pub passed: bool,
    /// What exactly went wrong, on failure.
    pub detail: Option<String>,
}

/// The checks that make up the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityCheckKind {
    /// Dataset is non-empty and every row carries a positive MOVIE_ID.
    Structure,
    /// NOMBRE_UNICO and MOVIE_ID stand in one-to-one correspondence.
    IdBijection,
    /// No two rows are identical across all columns.
    DuplicateRows,
    /// CATEGORIA_CINEPOLIS, DESCRIPCION2 and TITULO_LIMPIO_CLEAN equal
    /// their primary columns.
    MirrorColumns,
    /// CATEGORIA is a single token from the controlled vocabulary shape.
    CategoryShape,
    /// NOMBRE_UNICO carries only word characters and spaces.
    KeyCharacters,
    /// Members of a sampled key group agree on every coherent field.
    GroupCoherence,
    /// Enough metadata cells are filled.
    Completeness,
    /// IDIOMA agrees with language markers in the raw MOVIE_NAME.
    LanguageConsistency,
}

/// Severity levels for failed checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub enum QualitySeverity {
    /// Cosmetic or tolerance-based, worth flagging.
    Warning,
    /// Data defect that downstream consumers would notice.
    Error,
    /// Identity guarantee broken, dataset must not ship.
    Critical,
}

/// Trait for implementing final-dataset validation logic.
pub trait QualityValidator {
    /// Run the check battery over a finished dataset.
    fn validate(&self, rows: &[MovieRow]) -> QualityReport;
}

/// Default validator with configurable tolerances.
pub struct DefaultQualityValidator {
    /// Configuration for validation tolerances.
    pub config: QualityValidatorConfig,
}

/// Tolerances for the check battery.
#[derive(Debug, Clone)]
pub struct QualityValidatorConfig {
    /// Minimum share of filled metadata cells, in percent.
    pub completeness_threshold: f64,
    /// How many key groups the coherence check samples.
    pub coherence_sample: usize,
    /// Battery version identifier.
    pub rule_version: String,
}

impl Default for QualityValidatorConfig {
    fn default() -> Self {
        Self {
            completeness_threshold: 95.0,
            coherence_sample: 50,
            rule_version: "v1.0.0".to_string(),
        }
    }
}

impl DefaultQualityValidator {
    /// Create a validator with default tolerances.
    pub fn new() -> Self {
        Self {
            config: QualityValidatorConfig::default(),
        }
    }

    /// Create a validator with custom tolerances.
    pub fn with_config(config: QualityValidatorConfig) -> Self {
        Self { config }
    }

    fn check_structure(&self, rows: &[MovieRow]) -> QualityCheck {
        if rows.is_empty() {
            return fail(
                QualityCheckKind::Structure,
                QualitySeverity::Critical,
                "dataset is empty".to_string(),
            );
        }
        let zero_ids = rows.iter().filter(|r| r.movie_id == 0).count();
        if zero_ids > 0 {
            return fail(
                QualityCheckKind::Structure,
                QualitySeverity::Critical,
                format!("{} rows carry no MOVIE_ID", zero_ids),
            );
        }
        pass(QualityCheckKind::Structure, QualitySeverity::Critical)
    }

    /// Each non-empty NOMBRE_UNICO must own exactly one MOVIE_ID and each
    /// MOVIE_ID exactly one key. Keyless rows are singleton unknowns: their
    /// IDs must not collide with each other or with any keyed ID.
    fn check_id_bijection(&self, rows: &[MovieRow]) -> QualityCheck {
        let mut ids_by_key: HashMap<&str, HashSet<u64>> = HashMap::new();
        let mut keys_by_id: HashMap<u64, HashSet<&str>> = HashMap::new();
        let mut unnamed_ids: Vec<u64> = Vec::new();

        for row in rows {
            if row.nombre_unico.is_empty() {
                unnamed_ids.push(row.movie_id);
            } else {
                ids_by_key
                    .entry(row.nombre_unico.as_str())
                    .or_default()
                    .insert(row.movie_id);
                keys_by_id
                    .entry(row.movie_id)
                    .or_default()
                    .insert(row.nombre_unico.as_str());
            }
        }

        let split_keys = ids_by_key.values().filter(|ids| ids.len() > 1).count();
        let shared_ids = keys_by_id.values().filter(|keys| keys.len() > 1).count();
        let mut seen = HashSet::new();
        let mut collisions = 0;
        for id in &unnamed_ids {
            if keys_by_id.contains_key(id) || !seen.insert(*id) {
                collisions += 1;
            }
        }

        if split_keys > 0 || shared_ids > 0 || collisions > 0 {
            return fail(
                QualityCheckKind::IdBijection,
                QualitySeverity::Critical,
                format!(
                    "{} keys map to multiple IDs, {} IDs span multiple keys, {} keyless ID collisions",
                    split_keys, shared_ids, collisions
                ),
            );
        }
        pass(QualityCheckKind::IdBijection, QualitySeverity::Critical)
    }

    fn check_duplicate_rows(&self, rows: &[MovieRow]) -> QualityCheck {
        let mut seen: HashSet<&MovieRow> = HashSet::new();
        let duplicated = rows.iter().filter(|row| !seen.insert(*row)).count();
        if duplicated > 0 {
            return fail(
                QualityCheckKind::DuplicateRows,
                QualitySeverity::Error,
                format!("{} fully duplicated rows", duplicated),
            );
        }
        pass(QualityCheckKind::DuplicateRows, QualitySeverity::Error)
    }

    fn check_mirror_columns(&self, rows: &[MovieRow]) -> QualityCheck {
        let divergent = rows
            .iter()
            .filter(|r| {
                r.categoria_cinepolis != r.categoria
                    || r.descripcion2 != r.descripcion
                    || r.titulo_limpio_clean != r.nombre_original_clean
            })
            .count();
        if divergent > 0 {
            return fail(
                QualityCheckKind::MirrorColumns,
                QualitySeverity::Error,
                format!("{} rows with diverged mirror columns", divergent),
            );
        }
        pass(QualityCheckKind::MirrorColumns, QualitySeverity::Error)
    }

    fn check_category_shape(&self, rows: &[MovieRow]) -> QualityCheck {
        let multiword = rows.iter().filter(|r| r.categoria.contains(' ')).count();
        if multiword > 0 {
            return fail(
                QualityCheckKind::CategoryShape,
                QualitySeverity::Warning,
                format!("{} rows with multi-word CATEGORIA", multiword),
            );
        }
        pass(QualityCheckKind::CategoryShape, QualitySeverity::Warning)
    }

    fn check_key_characters(&self, rows: &[MovieRow]) -> QualityCheck {
        let dirty = rows
            .iter()
            .filter(|r| NON_WORD.is_match(&r.nombre_unico))
            .count();
        if dirty > 0 {
            return fail(
                QualityCheckKind::KeyCharacters,
                QualitySeverity::Error,
                format!("{} keys with stray punctuation", dirty),
            );
        }
        pass(QualityCheckKind::KeyCharacters, QualitySeverity::Error)
    }

    /// Samples key groups in lexicographic order and demands full agreement
    /// on the coherent fields, empty or not. Propagation only fills gaps, so
    /// a residual split here means two sources disagreed about one movie.
    fn check_group_coherence(&self, rows: &[MovieRow]) -> QualityCheck {
        let mut groups: BTreeMap<&str, Vec<&MovieRow>> = BTreeMap::new();
        for row in rows {
            if !row.nombre_unico.is_empty() {
                groups
                    .entry(row.nombre_unico.as_str())
                    .or_default()
                    .push(row);
            }
        }

        let divergent = groups
            .values()
            .filter(|members| members.len() > 1)
            .take(self.config.coherence_sample)
            .filter(|members| {
                let first = members[0];
                members.iter().skip(1).any(|m| {
                    m.categoria != first.categoria
                        || m.descripcion != first.descripcion
                        || m.actor_principal != first.actor_principal
                        || m.director != first.director
                        || m.duracion != first.duracion
                        || m.familia != first.familia
                })
            })
            .count();

        if divergent > 0 {
            return fail(
                QualityCheckKind::GroupCoherence,
                QualitySeverity::Error,
                format!("{} sampled groups with diverging metadata", divergent),
            );
        }
        pass(QualityCheckKind::GroupCoherence, QualitySeverity::Error)
    }

    fn check_completeness(&self, rows: &[MovieRow]) -> QualityCheck {
        let total = rows.len() * 5;
        if total == 0 {
            return pass(QualityCheckKind::Completeness, QualitySeverity::Warning);
        }
        let filled: usize = rows
            .iter()
            .map(|r| {
                [
                    &r.categoria,
                    &r.descripcion,
                    &r.actor_principal,
                    &r.director,
                    &r.duracion,
                ]
                .iter()
                .filter(|v| !v.is_empty())
                .count()
            })
            .sum();
        let percent = filled as f64 / total as f64 * 100.0;
        if percent < self.config.completeness_threshold {
            return fail(
                QualityCheckKind::Completeness,
                QualitySeverity::Warning,
                format!(
                    "{:.1}% of metadata cells filled, threshold is {:.1}%",
                    percent, self.config.completeness_threshold
                ),
            );
        }
        pass(QualityCheckKind::Completeness, QualitySeverity::Warning)
    }

    /// A whole-word ESP, SUB, DOB or DUB in the raw name pins the expected
    /// IDIOMA. Names containing a known lookalike word (ESPECIAL, ESPOSA and
    /// friends) are exempt from the ESP rule.
    fn check_language_consistency(&self, rows: &[MovieRow]) -> QualityCheck {
        let mismatched = rows.iter().filter(|r| language_mismatch(r)).count();
        if mismatched > 0 {
            return fail(
                QualityCheckKind::LanguageConsistency,
                QualitySeverity::Warning,
                format!("{} rows where IDIOMA contradicts the raw name", mismatched),
            );
        }
        pass(
            QualityCheckKind::LanguageConsistency,
            QualitySeverity::Warning,
        )
    }
}

impl QualityValidator for DefaultQualityValidator {
    fn validate(&self, rows: &[MovieRow]) -> QualityReport {
        let checks = vec![
            self.check_structure(rows),
            self.check_id_bijection(rows),
            self.check_duplicate_rows(rows),
            self.check_mirror_columns(rows),
            self.check_category_shape(rows),
            self.check_key_characters(rows),
            self.check_group_coherence(rows),
            self.check_completeness(rows),
            self.check_language_consistency(rows),
        ];

        let passed = checks.iter().filter(|c| c.passed).count();
        let score = passed as f64 / checks.len() as f64 * 100.0;

        QualityReport {
            certified: passed == checks.len(),
            score,
            rows_validated: rows.len(),
            checks,
            rule_version: self.config.rule_version.clone(),
            validated_at: Utc::now(),
        }
    }
}

impl Default for DefaultQualityValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn pass(kind: QualityCheckKind, severity: QualitySeverity) -> QualityCheck {
    QualityCheck {
        kind,
        severity,
        passed: true,
        detail: None,
    }
}

fn fail(kind: QualityCheckKind, severity: QualitySeverity, detail: String) -> QualityCheck {
    QualityCheck {
        kind,
        severity,
        passed: false,
        detail: Some(detail),
    }
}

fn language_mismatch(row: &MovieRow) -> bool {
    let name = row.movie_name.to_uppercase();
    if ESP_FALSE_POSITIVES.iter().any(|fp| name.contains(fp)) {
        return false;
    }
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let expected = if tokens.contains(&"ESP") {
        Some("ESP")
    } else if tokens.contains(&"SUB") {
        Some("SUB")
    } else if tokens.contains(&"DUB") || tokens.contains(&"DOB") {
        Some("DUB")
    } else {
        None
    };
    match expected {
        Some(code) => row.idioma != code,
        None => false,
    }
}
