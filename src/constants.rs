/// Shared vocabulary for the standardization pipeline: column names, the
/// controlled category set, and the token tables the extractors match against.

// Input table columns
pub const COL_MOVIE_NAME: &str = "MOVIE_NAME";
pub const COL_MOVIE_FORMAT: &str = "MOVIE_FORMAT";
pub const COL_MOVIE_LANGUAGE: &str = "MOVIE_LENGUAJE";
pub const COL_MOVIE_DURATION: &str = "MOVIE_DURATION";

pub const REQUIRED_INPUT_COLUMNS: [&str; 1] = [COL_MOVIE_NAME];

/// Output table columns, in the exact order rows are emitted.
pub const OUTPUT_COLUMNS: [&str; 17] = [
    "MOVIE_ID",
    "MOVIE_NAME",
    "TITULO_LIMPIO",
    "FORMATO",
    "IDIOMA",
    "CATEGORIA",
    "DESCRIPCION",
    "FAMILIA",
    "NOMBRE_ORIGINAL",
    "DESCRIPCION2",
    "ACTOR_PRINCIPAL",
    "DIRECTOR",
    "DURACION",
    "CATEGORIA_CINEPOLIS",
    "NOMBRE_ORIGINAL_CLEAN",
    "TITULO_LIMPIO_CLEAN",
    "NOMBRE_UNICO",
];

/// Side-channel MOVIE_FORMAT values with a known exhibition format.
/// Language-only codes carry no format information and resolve to 2D.
pub const FORMAT_MAPPING: [(&str, &str); 20] = [
    ("ESP", "2D"),
    ("SUB", "2D"),
    ("DUB", "2D"),
    ("DOB", "2D"),
    ("SP", "2D"),
    ("4DX", "4D"),
    ("4DX 3D", "4D"),
    ("4DX/3D", "4D"),
    ("4DX/2D", "4D"),
    ("4DX 3D DOB", "4D"),
    ("4DX 3D DUB", "4D"),
    ("4DX 3D SUB", "4D"),
    ("SCREENX", "SCREENX"),
    ("XE SCREENX", "SCREENX"),
    ("XE", "SCREENX"),
    ("IMAX", "IMAX"),
    ("3D", "3D"),
    ("3D ESP", "3D"),
    ("3D SUB", "3D"),
    ("3D DOB", "3D"),
];

/// Leading articles stripped when deriving the canonical key.
pub const LEADING_ARTICLES: [&str; 7] = ["THE", "LA", "EL", "LOS", "LAS", "UN", "UNA"];

/// Controlled category vocabulary (single tokens, I4).
pub const CATEGORY_VOCABULARY: [&str; 12] = [
    "ACCION",
    "AVENTURA",
    "DRAMA",
    "COMEDIA",
    "TERROR",
    "THRILLER",
    "CIENCIA_FICCION",
    "FANTASIA",
    "ANIMACION",
    "ROMANCE",
    "DOCUMENTAL",
    "MUSICAL",
];

/// Raw category text to controlled token.
pub const CATEGORY_MAPPING: [(&str, &str); 19] = [
    ("ACCIÓN", "ACCION"),
    ("ACCION", "ACCION"),
    ("ACTION", "ACCION"),
    ("AVENTURA", "AVENTURA"),
    ("DRAMA", "DRAMA"),
    ("BIOGRAFÍA", "DRAMA"),
    ("HISTÓRICO", "DRAMA"),
    ("COMEDIA", "COMEDIA"),
    ("COMEDY", "COMEDIA"),
    ("TERROR", "TERROR"),
    ("HORROR", "TERROR"),
    ("THRILLER", "THRILLER"),
    ("SUSPENSE", "THRILLER"),
    ("CIENCIA", "CIENCIA_FICCION"),
    ("FANTASÍA", "FANTASIA"),
    ("ANIMACIÓN", "ANIMACION"),
    ("ANIMATION", "ANIMACION"),
    ("ROMANCE", "ROMANCE"),
    ("DOCUMENTAL", "DOCUMENTAL"),
];

/// Category chosen when the raw text resolves to more than one token.
pub const CATEGORY_PRIORITIES: [&str; 5] = ["ACCION", "TERROR", "COMEDIA", "DRAMA", "ANIMACION"];

pub const DEFAULT_CATEGORY: &str = "DRAMA";

/// Words that contain ESP without naming the language. The language coherence
/// check skips names carrying any of these.
pub const ESP_FALSE_POSITIVES: [&str; 5] =
    ["ESPECIAL", "ESPOSA", "ESPÍRITU", "ESPACIO", "ESPERANZA"];

/// Enrichment source adapter names, also the accepted values in config.
pub const CINEPOLIS_SOURCE: &str = "cinepolis";
pub const WIKIPEDIA_SOURCE: &str = "wikipedia";
pub const IMDB_SOURCE: &str = "imdb";

pub fn supported_sources() -> Vec<&'static str> {
    vec![CINEPOLIS_SOURCE, WIKIPEDIA_SOURCE, IMDB_SOURCE]
}
