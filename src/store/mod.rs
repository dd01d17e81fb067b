pub mod contract_store;
pub mod mapping;

pub use contract_store::ContractStore;
