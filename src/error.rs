use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunnelError {
    #[error("missing required columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },
    #[error("date column unparsable: {value:?}")]
    DateParse { value: String },
    #[error("column {column} row {row}: cannot read {value:?} as a number")]
    NumberParse {
        column: &'static str,
        row: usize,
        value: String,
    },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, FunnelError>;
