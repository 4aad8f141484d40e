use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::LEADING_ARTICLES;
use crate::pipeline::processing::attributes::AttributeExtractor;
use crate::pipeline::processing::family::FamilyDetector;
use crate::types::{FormatCode, LanguageCode, RawRecord};

/// Trailing language and format markers, in the order they are stripped.
/// Both kinds can stack ("AVATAR 4DX 3D DOB"), so level-2 normalization
/// applies the whole list repeatedly until nothing matches.
static SUFFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\s+ESP$",
        r"(?i)\s+SUB$",
        r"(?i)\s+DUB$",
        r"(?i)\s+DOB$",
        r"(?i)\s+SP$",
        r"(?i)\s+4DX.*$",
        r"(?i)\s+IMAX.*$",
        r"(?i)\s+SCREENX.*$",
        r"(?i)\s+XE.*$",
        r"(?i)\s+3D.*$",
        r"(?i)\s+2D.*$",
        r"(?i)\s+4D.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A raw record with every derived identity and attribute attached. The raw
/// row rides along untouched so the output builder can echo the original name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub raw: RawRecord,
    /// Level 1: trimmed, uppercased, single-spaced raw name.
    pub title_l1: String,
    /// Level 2: level 1 with trailing language/format markers removed.
    pub title_l2: String,
    /// Deduplication identity of the movie.
    pub canonical_key: String,
    /// Franchise grouping key derived from level 2.
    pub family_key: String,
    pub format: FormatCode,
    pub language: LanguageCode,
    pub duration_minutes: Option<u32>,
}

/// Trait for turning one raw POS row into its normalized form. Total: every
/// input, however malformed, produces a record (possibly with empty keys).
pub trait Normalizer {
    fn normalize(&self, raw: &RawRecord) -> NormalizedRecord;
}

/// Default normalizer wiring the title levels, attribute extraction and
/// family detection together.
pub struct DefaultNormalizer {
    attributes: AttributeExtractor,
    family: FamilyDetector,
}

impl Default for DefaultNormalizer {
    fn default() -> Self {
        Self::new(AttributeExtractor::default())
    }
}

impl DefaultNormalizer {
    pub fn new(attributes: AttributeExtractor) -> Self {
        Self {
            attributes,
            family: FamilyDetector::new(),
        }
    }

    /// Level 1: trim, uppercase, collapse internal whitespace runs.
    pub fn title_level1(&self, raw_name: &str) -> String {
        let upper = raw_name.trim().to_uppercase();
        WHITESPACE_RUN.replace_all(&upper, " ").into_owned()
    }

    /// Level 2: strip trailing language/format markers until a fixpoint.
    pub fn title_level2(&self, raw_name: &str) -> String {
        let mut title = self.title_level1(raw_name);
        loop {
            let mut changed = false;
            for pattern in SUFFIX_PATTERNS.iter() {
                let stripped = pattern.replace(&title, "").into_owned();
                if stripped != title {
                    title = stripped;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        title.trim().to_string()
    }

    /// Canonical key: level 2 with punctuation flattened to spaces, one
    /// leading article removed, single-spaced, uppercase.
    ///
    /// Applying this to its own output is a no-op. The article strip is
    /// skipped when the following token is itself an article ("LA LA LAND"),
    /// otherwise repeated application would keep shortening the key.
    pub fn canonical_key(&self, title_l2: &str) -> String {
        let flattened = NON_ALPHANUMERIC.replace_all(title_l2, " ");
        let collapsed = WHITESPACE_RUN
            .replace_all(&flattened, " ")
            .trim()
            .to_uppercase();

        let mut tokens = collapsed.split(' ');
        match (tokens.next(), tokens.next()) {
            (Some(first), Some(second))
                if LEADING_ARTICLES.contains(&first) && !LEADING_ARTICLES.contains(&second) =>
            {
                collapsed[first.len() + 1..].to_string()
            }
            _ => collapsed,
        }
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, raw: &RawRecord) -> NormalizedRecord {
        let title_l1 = self.title_level1(&raw.movie_name);
        let title_l2 = self.title_level2(&raw.movie_name);
        let canonical_key = self.canonical_key(&title_l2);
        let family_key = self.family.detect(&title_l2);

        NormalizedRecord {
            title_l1,
            canonical_key,
            family_key,
            format: self
                .attributes
                .extract_format(&raw.movie_name, raw.movie_format.as_deref()),
            language: self
                .attributes
                .extract_language(&raw.movie_name, raw.movie_language.as_deref()),
            duration_minutes: self
                .attributes
                .extract_duration(raw.movie_duration.as_deref()),
            title_l2,
            raw: raw.clone(),
        }
    }
}
