//! Prowl Export - Spreadsheet export and import.
//!
//! Records are written with a fixed column layout, either as an Excel
//! workbook or as CSV depending on the file extension. The same layout is
//! read back to resume a run at the enrichment stage.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod atomic;
pub mod delimited;
pub mod error;
pub mod layout;
pub mod xlsx;

pub use error::{ExportError, Result};
pub use layout::{Cell, Column, HeaderMap, Layout};

use prowl_core::Record;
use std::path::Path;

/// File formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xlsx,
    Csv,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xlsm" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Records read back from an export file.
#[derive(Debug, Clone, Default)]
pub struct Imported {
    pub records: Vec<Record>,
    /// Whether the file carried the enrichment columns
    pub has_enrichment: bool,
}

/// Write `records` to `path`, replacing any existing file.
///
/// The enrichment columns are included when `with_enrichment` is set.
pub fn export_records(path: &Path, records: &[Record], with_enrichment: bool) -> Result<()> {
    let format = Format::from_path(path)?;
    let layout = Layout::new(with_enrichment);

    match format {
        Format::Xlsx => xlsx::write(path, records, &layout)?,
        Format::Csv => delimited::write(path, records, &layout)?,
    }

    tracing::info!(
        "Saved {} records to {} ({:?})",
        records.len(),
        path.display(),
        format
    );
    Ok(())
}

/// Read records written by [`export_records`].
pub fn import_records(path: &Path) -> Result<Imported> {
    let (records, has_enrichment) = match Format::from_path(path)? {
        Format::Xlsx => xlsx::read(path)?,
        Format::Csv => delimited::read(path)?,
    };

    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(Imported {
        records,
        has_enrichment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            Format::from_path(Path::new("producthunt.xlsx")).unwrap(),
            Format::Xlsx
        );
        assert_eq!(
            Format::from_path(Path::new("out/Products.CSV")).unwrap(),
            Format::Csv
        );
        assert!(Format::from_path(Path::new("products.json")).is_err());
        assert!(Format::from_path(Path::new("products")).is_err());
    }
}
