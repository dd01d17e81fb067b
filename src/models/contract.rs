use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A contract as callers see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: u64,
    pub company_name: String,
    pub inn: String,
    pub director: String,
    pub address: String,
    pub end_date: String,
    pub comments: String,
    #[serde(rename = "hasND")]
    pub has_nd: bool,
}

/// Payload for creating a contract. The ID is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub company_name: String,
    pub inn: String,
    pub director: String,
    pub address: String,
    pub end_date: String,
    #[serde(default)]
    pub comments: String,
    #[serde(rename = "hasND", default)]
    pub has_nd: bool,
}

/// Partial update. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPatch {
    pub company_name: Option<String>,
    pub inn: Option<String>,
    pub director: Option<String>,
    pub address: Option<String>,
    pub end_date: Option<String>,
    pub comments: Option<String>,
    #[serde(rename = "hasND")]
    pub has_nd: Option<bool>,
}

/// Lifecycle status reported to clients. Rows carry no status column, so
/// every contract reads as active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    Active,
}

/// JSON representation of a contract for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDto {
    #[serde(flatten)]
    pub contract: Contract,
    pub status: ContractStatus,
    pub history: Vec<Value>,
    /// Time the response was built; the sheet keeps no creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Contract> for ContractDto {
    fn from(contract: Contract) -> Self {
        Self {
            contract,
            status: ContractStatus::Active,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
