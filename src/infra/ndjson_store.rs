use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::app::ports::TabularStorePort;
use crate::constants::REQUIRED_INPUT_COLUMNS;
use crate::error::{PipelineError, Result};
use crate::types::{MovieRow, RawRecord};

/// Newline-delimited JSON table store: one object per line, keys named after
/// the table columns. Files are small enough to load whole, so IO stays sync
/// inside the async port methods.
pub struct NdjsonStore;

impl NdjsonStore {
    pub fn new() -> Self {
        Self
    }

    fn parse_lines<T, F>(path: &Path, mut parse: F) -> Result<Vec<T>>
    where
        F: FnMut(usize, Value) -> Result<T>,
    {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "cannot read table {}: {}; verify the path exists and is readable",
                path.display(),
                e
            ))
        })?;
        let mut rows = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(trimmed).map_err(|e| {
                PipelineError::Config(format!("{} line {}: {}", path.display(), index + 1, e))
            })?;
            rows.push(parse(index + 1, value)?);
        }
        Ok(rows)
    }
}

impl Default for NdjsonStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabularStorePort for NdjsonStore {
    async fn load_raw(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let mut seen_columns: Vec<&str> = Vec::new();
        let rows = Self::parse_lines(path, |_, value| {
            for column in REQUIRED_INPUT_COLUMNS {
                if !seen_columns.contains(&column) && value.get(column).is_some() {
                    seen_columns.push(column);
                }
            }
            Ok(serde_json::from_value::<RawRecord>(value)?)
        })?;

        // NDJSON has no header row; the keys of the data lines are the
        // columns. An extract with rows but no MOVIE_NAME key anywhere was
        // produced without the required column.
        if !rows.is_empty() {
            let missing: Vec<String> = REQUIRED_INPUT_COLUMNS
                .iter()
                .filter(|column| !seen_columns.contains(column))
                .map(|column| column.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(PipelineError::MissingColumns { columns: missing });
            }
        }

        debug!("Loaded {} raw records from {}", rows.len(), path.display());
        Ok(rows)
    }

    async fn load_finished(&self, path: &Path) -> Result<Vec<MovieRow>> {
        let rows = Self::parse_lines(path, |_, value| {
            Ok(serde_json::from_value::<MovieRow>(value)?)
        })?;
        debug!(
            "Loaded {} finished rows from {}",
            rows.len(),
            path.display()
        );
        Ok(rows)
    }

    async fn save_finished(&self, path: &Path, rows: &[MovieRow]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for row in rows {
            let line = serde_json::to_string(row)?;
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> NdjsonStore {
        NdjsonStore::new()
    }

    #[tokio::test]
    async fn loads_records_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.ndjson");
        fs::write(
            &path,
            concat!(
                "{\"MOVIE_NAME\":\"DUNE PARTE DOS 4DX SUB\",\"MOVIE_DURATION\":\"166 min\"}\n",
                "\n",
                "{\"MOVIE_NAME\":\"BARBIE ESP\"}\n",
            ),
        )
        .unwrap();

        let rows = store().load_raw(&path).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].movie_name, "DUNE PARTE DOS 4DX SUB");
        assert_eq!(rows[0].movie_duration.as_deref(), Some("166 min"));
        assert_eq!(rows[1].movie_name, "BARBIE ESP");
        assert_eq!(rows[1].movie_format, None);
    }

    #[tokio::test]
    async fn extract_without_movie_name_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.ndjson");
        fs::write(&path, "{\"TITLE\":\"DUNE\"}\n{\"TITLE\":\"BARBIE\"}\n").unwrap();

        let err = store().load_raw(&path).await.unwrap_err();
        match err {
            PipelineError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["MOVIE_NAME".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_line_reports_its_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.ndjson");
        fs::write(&path, "{\"MOVIE_NAME\":\"DUNE\"}\nnot json at all\n").unwrap();

        let err = store().load_raw(&path).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn missing_file_is_a_config_error_naming_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.ndjson");

        let err = store().load_raw(&path).await.unwrap_err();
        let message = err.to_string();
        assert!(
            message.contains("missing.ndjson"),
            "unexpected error: {message}"
        );
        assert!(
            message.contains("verify the path"),
            "unexpected error: {message}"
        );
        match err {
            PipelineError::Config(_) => {}
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_file_loads_as_no_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.ndjson");
        fs::write(&path, "").unwrap();

        let rows = store().load_raw(&path).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_finished_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/standardized.ndjson");
        let rows = vec![MovieRow {
            movie_id: 1,
            movie_name: "DUNE PARTE DOS 4DX SUB".to_string(),
            nombre_unico: "DUNE PARTE DOS".to_string(),
            formato: "4D".to_string(),
            ..Default::default()
        }];

        store().save_finished(&path, &rows).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(value["MOVIE_ID"], 1);
        assert_eq!(value["NOMBRE_UNICO"], "DUNE PARTE DOS");
        assert_eq!(value["FORMATO"], "4D");

        let reloaded = store().load_finished(&path).await.unwrap();
        assert_eq!(reloaded, rows);
    }

    #[tokio::test]
    async fn finished_loader_tolerates_missing_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.ndjson");
        fs::write(&path, "{\"MOVIE_ID\":4,\"NOMBRE_UNICO\":\"DUNE\"}\n").unwrap();

        let rows = store().load_finished(&path).await.unwrap();
        assert_eq!(rows[0].movie_id, 4);
        assert_eq!(rows[0].nombre_unico, "DUNE");
        assert_eq!(rows[0].categoria, "");
    }
}
