//! Page content and the login gate in front of protected pages.

pub mod patient_data;

use async_trait::async_trait;
use polars::prelude::{AnyValue, DataFrame};

pub use patient_data::PatientDataPage;

/// One piece of rendered page content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Text(String),
    Error(String),
    Table(TablePreview),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
}

/// Shape, schema and leading rows of one loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePreview {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub preview: Vec<Vec<String>>,
}

impl TablePreview {
    pub fn from_frame(name: &str, frame: &DataFrame, max_rows: usize) -> Self {
        let columns = frame
            .get_columns()
            .iter()
            .map(|column| ColumnSummary {
                name: column.name().to_string(),
                dtype: column.dtype().to_string(),
            })
            .collect();

        let shown = frame.height().min(max_rows);
        let preview = (0..shown)
            .map(|row| {
                frame
                    .get_columns()
                    .iter()
                    .map(|column| match column.get(row) {
                        Ok(value) => cell_text(value),
                        Err(_) => String::new(),
                    })
                    .collect()
            })
            .collect();

        Self {
            name: name.to_string(),
            rows: frame.height(),
            columns,
            preview,
        }
    }
}

fn cell_text(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Whether the current session may see a protected page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    Unauthenticated,
}

impl Access {
    pub fn from_login_status(logged_in: bool) -> Self {
        if logged_in {
            Access::Authenticated
        } else {
            Access::Unauthenticated
        }
    }
}

/// A page that is only shown to logged in users.
#[async_trait]
pub trait Page: Send + Sync {
    fn set_login_status(&mut self, logged_in: bool);

    fn access(&self) -> Access;

    async fn render_authenticated(&mut self) -> Vec<Block>;

    fn render_unauthenticated(&self) -> Vec<Block>;
}

/// Single entry point for rendering protected pages: checks access before
/// any page specific work (such as data retrieval) happens.
pub async fn render_guarded<P: Page + ?Sized>(page: &mut P) -> Vec<Block> {
    match page.access() {
        Access::Authenticated => page.render_authenticated().await,
        Access::Unauthenticated => page.render_unauthenticated(),
    }
}
