use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Sheet too large: cell ({row}, {col}) is outside the worksheet")]
    SheetTooLarge { row: usize, col: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
