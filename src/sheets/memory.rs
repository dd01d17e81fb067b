use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{records_from_values, Record, SheetBackend, SheetsError, FIRST_DATA_ROW};

/// In-process sheet with the same row semantics as a spreadsheet tab.
pub struct MemorySheet {
    headers: Vec<String>,
    rows: RwLock<Vec<Vec<String>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemorySheet {
    pub fn new(headers: &[&str]) -> Self {
        Self::with_rows(headers, Vec::new())
    }

    /// A sheet pre-filled with data rows (header row excluded).
    pub fn with_rows(headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: RwLock::new(rows),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `read_records` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of appends and row updates applied so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw cells of a sheet row, header row included as row 1.
    pub async fn row(&self, row_number: usize) -> Option<Vec<String>> {
        if row_number == 1 {
            return Some(self.headers.clone());
        }
        let rows = self.rows.read().await;
        row_number
            .checked_sub(FIRST_DATA_ROW)
            .and_then(|index| rows.get(index).cloned())
    }
}

#[async_trait]
impl SheetBackend for MemorySheet {
    async fn read_records(&self) -> Result<Vec<Record>, SheetsError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().await;

        let mut values = Vec::with_capacity(rows.len() + 1);
        values.push(self.headers.clone());
        values.extend(rows.iter().cloned());
        Ok(records_from_values(values))
    }

    async fn append_row(&self, values: &[String]) -> Result<(), SheetsError> {
        self.rows.write().await.push(values.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_row(&self, row_number: usize, values: &[String]) -> Result<(), SheetsError> {
        let mut rows = self.rows.write().await;
        let row = row_number
            .checked_sub(FIRST_DATA_ROW)
            .and_then(|index| rows.get_mut(index))
            .ok_or(SheetsError::RowOutOfRange(row_number))?;

        *row = values.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
