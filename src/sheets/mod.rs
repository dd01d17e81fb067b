//! Spreadsheet access.
//!
//! A sheet is read as a header row followed by data rows. Data rows are
//! surfaced as [`Record`]s keyed by header name, and written back as
//! positional cell lists.

pub mod auth;
pub mod client;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;

pub use client::GoogleSheetsClient;
pub use memory::MemorySheet;

/// Sheet row number of the first data row. Row 1 holds the headers.
pub const FIRST_DATA_ROW: usize = 2;

/// One data row, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    cells: HashMap<String, String>,
}

impl Record {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Cell value under `column`, or `""` when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Primitives required from the tabular backing store.
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// All data rows in sheet order. Blank rows are kept so that index + 2
    /// is the sheet row number.
    async fn read_records(&self) -> Result<Vec<Record>, SheetsError>;

    /// Appends one row after the last data row.
    async fn append_row(&self, values: &[String]) -> Result<(), SheetsError>;

    /// Overwrites the cells of an existing row, starting at column A.
    async fn update_row(&self, row_number: usize, values: &[String]) -> Result<(), SheetsError>;
}

/// Turns raw sheet values (header row first) into records. Short rows are
/// padded with empty cells.
pub fn records_from_values(mut values: Vec<Vec<String>>) -> Vec<Record> {
    if values.is_empty() {
        return Vec::new();
    }
    let headers = values.remove(0);

    values
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            Record::from_pairs(
                headers
                    .iter()
                    .map(|header| (header.clone(), cells.next().unwrap_or_default())),
            )
        })
        .collect()
}

/// A1-notation column letter for a 1-based column index.
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    #[error("Failed to sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid request URL: {0}")]
    Url(String),

    #[error("Row {0} is outside the sheet")]
    RowOutOfRange(usize),
}
