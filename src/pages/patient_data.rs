use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{Access, Block, Page, TablePreview};
use crate::dataset::{get_dataset, DatasetTable};
use crate::store::Bucket;

pub const TITLE: &str = "MIMIC-III Patient Data";
pub const LOGIN_REQUIRED: &str = "Please login to view this project's data";

/// The MIMIC-III patient data viewer.
///
/// Tables are fetched on the first authenticated render and kept for the
/// lifetime of the page. The cache is only considered filled when at least
/// one table was loaded, so a failed or empty fetch is retried on the next render.
pub struct PatientDataPage {
    tables: DatasetTable,
    logged_in: bool,
    dataset_path: String,
    bucket: Arc<dyn Bucket>,
    preview_rows: usize,
}

impl PatientDataPage {
    pub fn new(dataset_path: impl Into<String>, bucket: Arc<dyn Bucket>, preview_rows: usize) -> Self {
        Self {
            tables: DatasetTable::new(),
            logged_in: false,
            dataset_path: dataset_path.into(),
            bucket,
            preview_rows,
        }
    }

    pub fn tables(&self) -> &DatasetTable {
        &self.tables
    }
}

#[async_trait]
impl Page for PatientDataPage {
    fn set_login_status(&mut self, logged_in: bool) {
        self.logged_in = logged_in;
    }

    fn access(&self) -> Access {
        Access::from_login_status(self.logged_in)
    }

    async fn render_authenticated(&mut self) -> Vec<Block> {
        let mut blocks = vec![Block::Heading(TITLE.to_string())];

        if self.tables.is_empty() {
            info!("Fetching patient data from '{}'", self.dataset_path);
            match get_dataset(&self.dataset_path, self.bucket.as_ref()).await {
                Ok(tables) => self.tables = tables,
                Err(e) => blocks.push(Block::Error(e.to_string())),
            }
        }

        blocks.push(Block::Text(format!("{} tables loaded", self.tables.len())));
        blocks.extend(
            self.tables
                .iter()
                .map(|(name, frame)| Block::Table(TablePreview::from_frame(name, frame, self.preview_rows))),
        );
        blocks
    }

    fn render_unauthenticated(&self) -> Vec<Block> {
        vec![Block::Text(LOGIN_REQUIRED.to_string())]
    }
}
