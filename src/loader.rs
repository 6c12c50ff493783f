use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{FunnelError, Result};

const SAMPLE_CSV: &str = include_str!("../data/sample_data.csv");

static SAMPLE: OnceCell<RawTable> = OnceCell::new();

/// Where the dashboard data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Sample,
    File(PathBuf),
}

/// CSV contents with normalized header names and untyped cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn load_reader<R: Read>(input: R) -> Result<RawTable> {
    let mut reader = csv::Reader::from_reader(input);
    let columns = reader
        .headers()?
        .iter()
        .map(normalize_column)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for result in reader.records() {
        rows.push(result?);
    }

    debug!(columns = ?columns, rows = rows.len(), "parsed csv");
    Ok(RawTable { columns, rows })
}

pub fn load_path(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).map_err(|source| FunnelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_reader(file)?;
    info!(path = %path.display(), rows = table.rows.len(), "loaded csv");
    Ok(table)
}

/// The bundled quick-start dataset, parsed once per process.
pub fn load_sample() -> Result<&'static RawTable> {
    SAMPLE.get_or_try_init(|| {
        let table = load_reader(SAMPLE_CSV.as_bytes())?;
        info!(rows = table.rows.len(), "loaded bundled sample");
        Ok(table)
    })
}
