//! Dataset retrieval from object storage.
//!
//! Every `.csv` object under a prefix is downloaded and parsed into a
//! [`DataFrame`], keyed by its base filename.

use std::collections::BTreeMap;
use std::io::Cursor;

use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::store::{Bucket, StorageError};

/// Parsed tables keyed by base filename.
pub type DatasetTable = BTreeMap<String, DataFrame>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("HTTP error occurred when accessing GCS: {status} - {reason}")]
    Http { status: u16, reason: String },
    #[error("An unexpected error occurred while retrieving the dataset: {0}")]
    Unexpected(String),
}

impl From<StorageError> for DatasetError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Http { status, reason } => DatasetError::Http { status, reason },
            StorageError::Other(message) => DatasetError::Unexpected(message),
        }
    }
}

/// Loads every CSV object under `prefix` in `bucket`.
///
/// All matching objects are returned; duplicate base names across nested
/// prefixes resolve to the last one listed. A failure anywhere discards the
/// tables parsed so far. A prefix without CSV objects yields an empty table.
pub async fn get_dataset(prefix: &str, bucket: &dyn Bucket) -> Result<DatasetTable, DatasetError> {
    match fetch_tables(prefix, bucket).await {
        Ok(tables) => {
            info!(
                "Loaded {} tables from '{}' in bucket '{}'",
                tables.len(),
                prefix,
                bucket.name()
            );
            Ok(tables)
        }
        Err(e) => {
            error!("{}", e);
            Err(e)
        }
    }
}

async fn fetch_tables(prefix: &str, bucket: &dyn Bucket) -> Result<DatasetTable, DatasetError> {
    let mut tables = DatasetTable::new();

    for object in bucket.list(prefix).await? {
        if !object.ends_with(".csv") {
            continue;
        }
        debug!("Downloading dataset object '{}'", object);
        let content = bucket.download_text(&object).await?;
        let frame = parse_csv(content).map_err(|e| DatasetError::Unexpected(e.to_string()))?;
        tables.insert(base_name(&object).to_string(), frame);
    }

    Ok(tables)
}

/// Parses CSV text with a header row, inferring column types from the contents.
pub fn parse_csv(content: String) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(content.into_bytes()))
        .finish()
}

fn base_name(object: &str) -> &str {
    object.rsplit('/').next().unwrap_or(object)
}
