//! Flat-file CSV row store for Warung POS.
//!
//! Every persisted table is a comma-delimited UTF-8 file with a fixed header
//! row under a single data directory. A missing file reads as an empty table;
//! saving always creates the directory and writes the header, even for zero
//! rows. There is no locking: the design assumes a single writer process.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by the store layer (and the modules built on it).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed table {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// A typed row in one of the CSV stores. `HEADER` fixes both the on-disk
/// column order and the serialization order of the struct fields.
pub trait Record: Serialize + DeserializeOwned {
    const HEADER: &'static [&'static str];
}

/// Handle to the data directory holding all store files. Passed explicitly
/// into every operation so tests can point it at a scratch directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Order store (`pesanan.csv`).
    pub fn orders_file(&self) -> PathBuf {
        self.root.join("pesanan.csv")
    }

    /// Financial ledger (`keuangan.csv`).
    pub fn ledger_file(&self) -> PathBuf {
        self.root.join("keuangan.csv")
    }

    /// Product catalog (`produk.csv`).
    pub fn products_file(&self) -> PathBuf {
        self.root.join("produk.csv")
    }

    /// Ingredient stock (`bahan.csv`).
    pub fn ingredients_file(&self) -> PathBuf {
        self.root.join("bahan.csv")
    }
}

impl Default for DataDir {
    fn default() -> Self {
        Self::new("data")
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load all rows from a table file, in file order.
///
/// A missing file yields an empty vec (no file is created). A file that
/// exists but cannot be parsed into `T` is `StoreError::Malformed`.
pub fn load_rows<T: Record>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "table file absent, treating as empty");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T = result.map_err(|e| StoreError::Malformed {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Overwrite a table file with the given rows, creating the parent directory
/// if needed. The header row is always written, so an empty table still
/// round-trips with its schema intact.
pub fn save_rows<T: Record>(rows: &[T], path: &Path) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
    }

    let write_err = |e: csv::Error| StoreError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    // Header is written by hand so that zero-row saves still carry the
    // schema; serde serialization is told not to emit its own.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(write_err)?;
    writer.write_record(T::HEADER).map_err(write_err)?;
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| write_err(csv::Error::from(e)))?;
    Ok(())
}

/// Whether the file's header row contains the named column. A missing file
/// reports `false`.
pub fn has_column(path: &Path, column: &str) -> Result<bool, StoreError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers().map_err(|e| StoreError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(headers.iter().any(|h| h == column))
}

// ---------------------------------------------------------------------------
// Lenient field parsing
// ---------------------------------------------------------------------------

/// Monetary amounts from legacy files may be blank or junk; they read as 0
/// rather than failing the whole table.
pub(crate) fn de_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().parse().unwrap_or(0.0))
}

/// Boolean flags written by the previous bookkeeping tool are capitalized
/// ("True"/"False"); anything unrecognized reads as false.
pub(crate) fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "ya"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        nama: String,
        harga: f64,
    }

    impl Record for Row {
        const HEADER: &'static [&'static str] = &["nama", "harga"];
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().expect("tempdir");
        let rows: Vec<Row> = load_rows(&dir.path().join("nope.csv")).expect("load");
        assert!(rows.is_empty());
        // Loading must not create the file
        assert!(!dir.path().join("nope.csv").exists());
    }

    #[test]
    fn test_save_creates_directory_and_header() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("data").join("produk.csv");
        save_rows::<Row>(&[], &path).expect("save empty");

        let contents = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(contents.trim(), "nama,harga");

        let rows: Vec<Row> = load_rows(&path).expect("load empty");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_rows_round_trip_in_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("produk.csv");
        let rows = vec![
            Row {
                nama: "Seblak Original".into(),
                harga: 12000.0,
            },
            Row {
                nama: "Seblak Tulang".into(),
                harga: 18000.0,
            },
        ];
        save_rows(&rows, &path).expect("save");
        let loaded: Vec<Row> = load_rows(&path).expect("load");
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("produk.csv");
        std::fs::write(&path, "nama,harga\n\"unterminated,12000\n").expect("write junk");
        let err = load_rows::<Row>(&path).expect_err("should fail");
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_has_column() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("produk.csv");
        assert!(!has_column(&path, "nama").expect("absent file"));

        std::fs::write(&path, "nama,harga\n").expect("write");
        assert!(has_column(&path, "harga").expect("present"));
        assert!(!has_column(&path, "disinkronkan").expect("missing column"));
    }
}
