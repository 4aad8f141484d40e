use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\d+\s*$").unwrap());
static TRAILING_ROMAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[IVX]+\s*$").unwrap());
static COLON_SUBTITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s+.*$").unwrap());
static DASH_SUBTITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+-\s+.*$").unwrap());

/// Derives the franchise key from a level-2 title by stripping sequel and
/// subtitle markers: "DUNE PARTE DOS 2", "ROCKY III", "ALIEN: ROMULUS" and
/// "MISION IMPOSIBLE - SENTENCIA" all collapse onto their base name.
#[derive(Debug, Clone, Default)]
pub struct FamilyDetector;

impl FamilyDetector {
    pub fn new() -> Self {
        Self
    }

    /// Idempotent: a detected family key passes through unchanged. Stacked
    /// markers ("SAGA 3 2") need another round, so the chain runs until the
    /// string stops shrinking.
    pub fn detect(&self, title_l2: &str) -> String {
        let mut family = title_l2.trim().to_string();
        loop {
            let stripped = TRAILING_NUMBER.replace(&family, "");
            let stripped = TRAILING_ROMAN.replace(&stripped, "");
            let stripped = COLON_SUBTITLE.replace(&stripped, "");
            let stripped = DASH_SUBTITLE.replace(&stripped, "");
            let stripped = stripped.trim().to_string();
            if stripped == family {
                return family;
            }
            family = stripped;
        }
    }
}
