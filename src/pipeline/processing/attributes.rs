use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::FORMAT_MAPPING;
use crate::types::{FormatCode, LanguageCode};

static TRAILING_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s(ESP|SUB|DUB|DOB|SP)\s*$").unwrap());
static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());

/// Resolves presentation attributes (exhibition format, audio language,
/// runtime) for a row. Every extractor is total: unknown or missing input
/// lands on the documented default, never an error.
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    duration_min: u32,
    duration_max: u32,
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self {
            duration_min: 30,
            duration_max: 999,
        }
    }
}

impl AttributeExtractor {
    pub fn new(duration_min: u32, duration_max: u32) -> Self {
        Self {
            duration_min,
            duration_max,
        }
    }

    /// Side-channel MOVIE_FORMAT wins when it names a known code, then the
    /// raw name is scanned for format tokens in priority order, then 2D.
    pub fn extract_format(&self, raw_name: &str, side_channel: Option<&str>) -> FormatCode {
        if let Some(code) = side_channel {
            let code = code.trim().to_uppercase();
            if let Some((_, mapped)) = FORMAT_MAPPING.iter().find(|(key, _)| *key == code) {
                return format_from_table(mapped);
            }
        }

        let name = raw_name.to_uppercase();
        if name.contains("4DX") {
            FormatCode::FourD
        } else if name.contains("SCREENX") || name.contains("XE") {
            FormatCode::ScreenX
        } else if name.contains("IMAX") {
            FormatCode::Imax
        } else if name.contains("3D") {
            FormatCode::ThreeD
        } else {
            FormatCode::TwoD
        }
    }

    /// Side-channel MOVIE_LENGUAJE wins when it is a known code (DOB is the
    /// dubbed variant spelling), then a trailing token on the raw name, then
    /// ESP.
    pub fn extract_language(&self, raw_name: &str, side_channel: Option<&str>) -> LanguageCode {
        if let Some(code) = side_channel {
            match code.trim().to_uppercase().as_str() {
                "ESP" => return LanguageCode::Esp,
                "SUB" => return LanguageCode::Sub,
                "DUB" | "DOB" => return LanguageCode::Dub,
                _ => {}
            }
        }

        if let Some(captures) = TRAILING_LANGUAGE.captures(raw_name) {
            match captures[1].to_uppercase().as_str() {
                "SUB" => return LanguageCode::Sub,
                "DUB" | "DOB" => return LanguageCode::Dub,
                // SP is the abbreviated Spanish marker
                "ESP" | "SP" => return LanguageCode::Esp,
                _ => {}
            }
        }

        LanguageCode::Esp
    }

    /// First integer in the free-form duration string, accepted only inside
    /// the plausibility window.
    pub fn extract_duration(&self, raw_duration: Option<&str>) -> Option<u32> {
        let raw = raw_duration?;
        let captures = FIRST_NUMBER.captures(raw)?;
        let minutes: u32 = captures[1].parse().ok()?;
        if minutes >= self.duration_min && minutes <= self.duration_max {
            Some(minutes)
        } else {
            None
        }
    }
}

fn format_from_table(code: &str) -> FormatCode {
    match code {
        "3D" => FormatCode::ThreeD,
        "4D" => FormatCode::FourD,
        "IMAX" => FormatCode::Imax,
        "SCREENX" => FormatCode::ScreenX,
        _ => FormatCode::TwoD,
    }
}
