use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    cache::SnapshotCache,
    models::contract::{Contract, ContractPatch, NewContract},
    sheets::{Record, SheetBackend, SheetsError, FIRST_DATA_ROW},
    store::mapping::{id_matches, next_id, StoredRow, ID},
};

/// Contract store on top of a spreadsheet
pub struct ContractStore {
    sheet: Arc<dyn SheetBackend>,
    cache: SnapshotCache<Record>,
    // Serializes read-then-write sequences inside this process. Other
    // processes writing the same sheet can still race on new IDs.
    write_lock: Mutex<()>,
}

impl ContractStore {
    /// Create a new ContractStore reading through the given cache
    pub fn new(sheet: Arc<dyn SheetBackend>, cache: SnapshotCache<Record>) -> Self {
        Self {
            sheet,
            cache,
            write_lock: Mutex::new(()),
        }
    }

    async fn snapshot(&self) -> Result<Arc<Vec<Record>>, SheetsError> {
        self.cache.get_or_fetch(|| self.sheet.read_records()).await
    }

    /// Get all contracts in sheet order. Rows without a usable ID are skipped.
    pub async fn list_all(&self) -> Result<Vec<Contract>, SheetsError> {
        let records = self.snapshot().await?;

        let contracts: Vec<Contract> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                match StoredRow::from_record(record, index + FIRST_DATA_ROW) {
                    Ok(row) => Some(row.into_contract()),
                    Err(warning) => {
                        tracing::warn!("Skipping row: {}", warning);
                        None
                    }
                }
            })
            .collect();

        tracing::info!("Listed {} contracts from {} rows", contracts.len(), records.len());
        Ok(contracts)
    }

    /// Get a contract by ID
    pub async fn get(&self, id: u64) -> Result<Option<Contract>, SheetsError> {
        let records = self.snapshot().await?;

        Ok(locate(&records, id).map(|(_, record)| StoredRow::with_id(record, id).into_contract()))
    }

    /// First contract registered under the given tax ID
    pub async fn find_by_inn(&self, inn: &str) -> Result<Option<Contract>, SheetsError> {
        let records = self.snapshot().await?;
        let inn = inn.trim();

        Ok(records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| StoredRow::from_record(record, index + FIRST_DATA_ROW).ok())
            .find(|row| row.inn.trim() == inn)
            .map(StoredRow::into_contract))
    }

    /// Append a new contract with the next free ID
    pub async fn create(&self, input: NewContract) -> Result<Contract, SheetsError> {
        let _guard = self.write_lock.lock().await;
        let records = self.snapshot().await?;

        let row = StoredRow::from_new(next_id(&records), input);
        self.sheet.append_row(&row.cells()).await?;
        self.cache.invalidate().await;

        tracing::info!("Created contract {}", row.id);
        Ok(row.into_contract())
    }

    /// Overwrite the row of an existing contract. Returns `None` when no row
    /// carries the ID; nothing is written in that case.
    pub async fn update(&self, id: u64, patch: ContractPatch) -> Result<Option<Contract>, SheetsError> {
        let _guard = self.write_lock.lock().await;
        let records = self.snapshot().await?;

        let Some((row_number, record)) = locate(&records, id) else {
            tracing::info!("Contract {} not found for update", id);
            return Ok(None);
        };

        let row = StoredRow::with_id(record, id).merge(patch);
        self.sheet.update_row(row_number, &row.cells()).await?;
        self.cache.invalidate().await;

        tracing::info!("Updated contract {} at row {}", id, row_number);
        Ok(Some(row.into_contract()))
    }
}

/// Sheet row number and record of the first row carrying `id`.
fn locate(records: &[Record], id: u64) -> Option<(usize, &Record)> {
    records
        .iter()
        .enumerate()
        .find(|(_, record)| id_matches(record.get(ID), id))
        .map(|(index, record)| (index + FIRST_DATA_ROW, record))
}
