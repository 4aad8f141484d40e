use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One transactional row as it arrives from the POS extract. Never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "MOVIE_NAME", default)]
    pub movie_name: String,
    #[serde(rename = "MOVIE_FORMAT", default)]
    pub movie_format: Option<String>,
    #[serde(rename = "MOVIE_LENGUAJE", default)]
    pub movie_language: Option<String>,
    #[serde(rename = "MOVIE_DURATION", default)]
    pub movie_duration: Option<String>,
}

/// Exhibition format resolved for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatCode {
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
    #[serde(rename = "4D")]
    FourD,
    #[serde(rename = "IMAX")]
    Imax,
    #[serde(rename = "SCREENX")]
    ScreenX,
}

impl FormatCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatCode::TwoD => "2D",
            FormatCode::ThreeD => "3D",
            FormatCode::FourD => "4D",
            FormatCode::Imax => "IMAX",
            FormatCode::ScreenX => "SCREENX",
        }
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audio language resolved for a row. DOB collapses into DUB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "ESP")]
    Esp,
    #[serde(rename = "SUB")]
    Sub,
    #[serde(rename = "DUB")]
    Dub,
}

impl LanguageCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::Esp => "ESP",
            LanguageCode::Sub => "SUB",
            LanguageCode::Dub => "DUB",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The five enrichable metadata fields. Empty string means missing; the cache
/// file and all merge logic treat the two identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentData {
    #[serde(default)]
    pub categoria: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub actor_principal: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub duracion: String,
}

impl EnrichmentData {
    pub fn is_empty(&self) -> bool {
        self.categoria.is_empty()
            && self.descripcion.is_empty()
            && self.actor_principal.is_empty()
            && self.director.is_empty()
            && self.duracion.is_empty()
    }

    /// All five target fields carry a value.
    pub fn is_complete(&self) -> bool {
        !self.categoria.is_empty()
            && !self.descripcion.is_empty()
            && !self.actor_principal.is_empty()
            && !self.director.is_empty()
            && !self.duracion.is_empty()
    }

    /// First-non-empty-wins: fields already set keep their value, empty
    /// fields take the other side's value.
    pub fn fill_missing_from(&mut self, other: &EnrichmentData) {
        if self.categoria.is_empty() {
            self.categoria = other.categoria.clone();
        }
        if self.descripcion.is_empty() {
            self.descripcion = other.descripcion.clone();
        }
        if self.actor_principal.is_empty() {
            self.actor_principal = other.actor_principal.clone();
        }
        if self.director.is_empty() {
            self.director = other.director.clone();
        }
        if self.duracion.is_empty() {
            self.duracion = other.duracion.clone();
        }
    }
}

/// One fully standardized output row. Column names and order match the
/// published table contract. Deserialization tolerates missing columns so
/// the corrective commands can load damaged tables and let the validator
/// report what is wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieRow {
    #[serde(rename = "MOVIE_ID")]
    pub movie_id: u64,
    #[serde(rename = "MOVIE_NAME")]
    pub movie_name: String,
    #[serde(rename = "TITULO_LIMPIO")]
    pub titulo_limpio: String,
    #[serde(rename = "FORMATO")]
    pub formato: String,
    #[serde(rename = "IDIOMA")]
    pub idioma: String,
    #[serde(rename = "CATEGORIA")]
    pub categoria: String,
    #[serde(rename = "DESCRIPCION")]
    pub descripcion: String,
    #[serde(rename = "FAMILIA")]
    pub familia: String,
    #[serde(rename = "NOMBRE_ORIGINAL")]
    pub nombre_original: String,
    #[serde(rename = "DESCRIPCION2")]
    pub descripcion2: String,
    #[serde(rename = "ACTOR_PRINCIPAL")]
    pub actor_principal: String,
    #[serde(rename = "DIRECTOR")]
    pub director: String,
    #[serde(rename = "DURACION")]
    pub duracion: String,
    #[serde(rename = "CATEGORIA_CINEPOLIS")]
    pub categoria_cinepolis: String,
    #[serde(rename = "NOMBRE_ORIGINAL_CLEAN")]
    pub nombre_original_clean: String,
    #[serde(rename = "TITULO_LIMPIO_CLEAN")]
    pub titulo_limpio_clean: String,
    #[serde(rename = "NOMBRE_UNICO")]
    pub nombre_unico: String,
}

/// Core trait every enrichment source adapter implements. Transport and parse
/// failures surface as Err here; the merger is the boundary that turns them
/// into empty data and moves on.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Unique identifier for this source, also its config name.
    fn source_name(&self) -> &'static str;

    /// Look up metadata for a canonical movie name. Partial results are fine.
    async fn lookup(&self, canonical_name: &str) -> Result<EnrichmentData>;
}
