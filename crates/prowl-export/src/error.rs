use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write workbook: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to read workbook: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("unsupported file format: {0} (expected .xlsx or .csv)")]
    UnsupportedFormat(String),

    #[error("workbook has no worksheet")]
    EmptyWorkbook,

    #[error("missing column '{0}' in header row")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("too many rows for a worksheet: {0}")]
    TooManyRows(usize),
}
