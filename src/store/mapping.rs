//! Conversion between sheet records and contracts.
//!
//! The sheet has no typed schema: the ND flag and the ID are stored as text,
//! and end dates arrive in whatever format the sheet's editors typed. All of
//! that is decoded and encoded here.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::contract::{Contract, ContractPatch, NewContract};
use crate::sheets::Record;

pub const COMPANY_NAME: &str = "Название компании";
pub const INN: &str = "ИНН";
pub const DIRECTOR: &str = "Директор";
pub const ADDRESS: &str = "Адрес";
pub const END_DATE: &str = "Дата окончания";
pub const COMMENTS: &str = "Комментарии";
pub const HAS_ND: &str = "НД";
pub const ID: &str = "ID";

/// Header row, in column order. The ID is the last column.
pub const HEADERS: [&str; 8] = [COMPANY_NAME, INN, DIRECTOR, ADDRESS, END_DATE, COMMENTS, HAS_ND, ID];

const ISO_DATE: &str = "%Y-%m-%d";
const DOTTED_DATE: &str = "%d.%m.%Y";

/// A row that could not be mapped cleanly. Logged, never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingWarning {
    #[error("row {row} has no ID")]
    MissingId { row: usize },

    #[error("row {row} has a non-numeric ID {value:?}")]
    InvalidId { row: usize, value: String },

    #[error("unparseable end date {value:?}")]
    UnparseableDate { value: String },
}

pub fn encode_flag(flag: bool) -> String {
    let cell = if flag { "true" } else { "false" };
    cell.to_string()
}

/// Only the literal `true` (any case, surrounding whitespace ignored) is set.
pub fn decode_flag(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case("true")
}

pub fn encode_id(id: u64) -> String {
    id.to_string()
}

/// Positive integer IDs only. `None` for empty, zero or non-numeric cells.
pub fn decode_id(cell: &str) -> Option<u64> {
    cell.trim().parse().ok().filter(|id| *id > 0)
}

/// Whether the stored ID cell refers to `id`. Decoded the same way as for
/// listing, so `05` matches 5 and `0` never matches.
pub fn id_matches(cell: &str, id: u64) -> bool {
    decode_id(cell) == Some(id)
}

/// Parses `YYYY-MM-DD`, `DD.MM.YYYY` or an RFC 3339 timestamp.
pub fn normalize_end_date(raw: &str) -> Result<NaiveDate, MappingWarning> {
    let value = raw.trim();

    NaiveDate::parse_from_str(value, ISO_DATE)
        .or_else(|_| NaiveDate::parse_from_str(value, DOTTED_DATE))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| MappingWarning::UnparseableDate {
            value: raw.to_string(),
        })
}

/// End date as reported to clients. Unparseable dates are logged and
/// replaced with today's date.
pub fn end_date_or_placeholder(raw: &str) -> String {
    let date = normalize_end_date(raw).unwrap_or_else(|warning| {
        tracing::warn!("{}, substituting current date", warning);
        Utc::now().date_naive()
    });
    date.format(ISO_DATE).to_string()
}

/// `max(existing IDs) + 1`; cells without a valid ID count as 0.
pub fn next_id(records: &[Record]) -> u64 {
    records
        .iter()
        .filter_map(|record| decode_id(record.get(ID)))
        .max()
        .unwrap_or(0)
        + 1
}

/// A contract row as stored: text cells, with the end date kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub id: u64,
    pub company_name: String,
    pub inn: String,
    pub director: String,
    pub address: String,
    pub end_date: String,
    pub comments: String,
    pub has_nd: bool,
}

impl StoredRow {
    /// Decodes a record, rejecting rows without a usable ID. `row` is the
    /// sheet row number, used only for diagnostics.
    pub fn from_record(record: &Record, row: usize) -> Result<Self, MappingWarning> {
        let cell = record.get(ID);
        if cell.trim().is_empty() {
            return Err(MappingWarning::MissingId { row });
        }
        let id = decode_id(cell).ok_or_else(|| MappingWarning::InvalidId {
            row,
            value: cell.to_string(),
        })?;

        Ok(Self::with_id(record, id))
    }

    /// Decodes a record whose ID is already known.
    pub fn with_id(record: &Record, id: u64) -> Self {
        Self {
            id,
            company_name: record.get(COMPANY_NAME).to_string(),
            inn: record.get(INN).to_string(),
            director: record.get(DIRECTOR).to_string(),
            address: record.get(ADDRESS).to_string(),
            end_date: record.get(END_DATE).to_string(),
            comments: record.get(COMMENTS).to_string(),
            has_nd: decode_flag(record.get(HAS_ND)),
        }
    }

    pub fn from_new(id: u64, input: NewContract) -> Self {
        Self {
            id,
            company_name: input.company_name,
            inn: input.inn,
            director: input.director,
            address: input.address,
            end_date: input.end_date,
            comments: input.comments,
            has_nd: input.has_nd,
        }
    }

    /// Applies the supplied fields of `patch`; everything else stays as stored.
    pub fn merge(self, patch: ContractPatch) -> Self {
        Self {
            id: self.id,
            company_name: patch.company_name.unwrap_or(self.company_name),
            inn: patch.inn.unwrap_or(self.inn),
            director: patch.director.unwrap_or(self.director),
            address: patch.address.unwrap_or(self.address),
            end_date: patch.end_date.unwrap_or(self.end_date),
            comments: patch.comments.unwrap_or(self.comments),
            has_nd: patch.has_nd.unwrap_or(self.has_nd),
        }
    }

    /// Cells in column order, ready to write.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.company_name.clone(),
            self.inn.clone(),
            self.director.clone(),
            self.address.clone(),
            self.end_date.clone(),
            self.comments.clone(),
            encode_flag(self.has_nd),
            encode_id(self.id),
        ]
    }

    pub fn into_contract(self) -> Contract {
        Contract {
            id: self.id,
            end_date: end_date_or_placeholder(&self.end_date),
            company_name: self.company_name,
            inn: self.inn,
            director: self.director,
            address: self.address,
            comments: self.comments,
            has_nd: self.has_nd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: [&str; 8]) -> Record {
        Record::from_pairs(HEADERS.iter().copied().zip(cells))
    }

    #[test]
    fn flag_encoding() {
        assert_eq!(encode_flag(true), "true");
        assert_eq!(encode_flag(false), "false");
        assert!(decode_flag("true"));
        assert!(decode_flag("TRUE"));
        assert!(decode_flag(" true "));
        assert!(!decode_flag("false"));
        assert!(!decode_flag(""));
        assert!(!decode_flag("yes"));
    }

    #[test]
    fn id_decoding() {
        assert_eq!(decode_id("7"), Some(7));
        assert_eq!(decode_id(" 12 "), Some(12));
        assert_eq!(decode_id(""), None);
        assert_eq!(decode_id("0"), None);
        assert_eq!(decode_id("-3"), None);
        assert_eq!(decode_id("abc"), None);
        assert!(id_matches(" 5", 5));
        assert!(id_matches("05", 5));
        assert!(!id_matches("0", 0));
        assert!(!id_matches("x5", 5));
    }

    #[test]
    fn both_date_formats_normalize_to_same_day() {
        let dotted = normalize_end_date("21.03.2025").unwrap();
        let iso = normalize_end_date("2025-03-21").unwrap();

        assert_eq!(dotted, iso);
        assert_eq!(dotted, NaiveDate::from_ymd_opt(2025, 3, 21).unwrap());
        assert_eq!(
            normalize_end_date("2025-03-21T00:00:00.000Z").unwrap(),
            iso
        );
    }

    #[test]
    fn unparseable_date_falls_back_to_today() {
        let warning = normalize_end_date("not-a-date").unwrap_err();
        assert_eq!(
            warning,
            MappingWarning::UnparseableDate {
                value: "not-a-date".into()
            }
        );

        let placeholder = end_date_or_placeholder("not-a-date");
        assert_ne!(placeholder, "not-a-date");
        assert_eq!(placeholder, Utc::now().date_naive().format(ISO_DATE).to_string());
    }

    #[test]
    fn next_id_ignores_missing_and_invalid_ids() {
        assert_eq!(next_id(&[]), 1);

        let records = vec![
            record(["A", "1", "D", "Addr", "2025-01-01", "", "false", "3"]),
            record(["B", "2", "D", "Addr", "2025-01-01", "", "false", ""]),
            record(["C", "3", "D", "Addr", "2025-01-01", "", "false", "x"]),
            record(["D", "4", "D", "Addr", "2025-01-01", "", "false", "9"]),
        ];
        assert_eq!(next_id(&records), 10);
    }

    #[test]
    fn rows_without_usable_id_are_rejected() {
        let missing = record(["A", "1", "D", "Addr", "2025-01-01", "", "false", ""]);
        assert_eq!(
            StoredRow::from_record(&missing, 4),
            Err(MappingWarning::MissingId { row: 4 })
        );

        let invalid = record(["A", "1", "D", "Addr", "2025-01-01", "", "false", "abc"]);
        assert!(matches!(
            StoredRow::from_record(&invalid, 5),
            Err(MappingWarning::InvalidId { row: 5, .. })
        ));
    }

    #[test]
    fn record_maps_to_contract() {
        let stored = StoredRow::from_record(
            &record(["Acme", "123", "Jane", "1 Main St", "21.03.2025", "vip", "true", "4"]),
            2,
        )
        .unwrap();

        assert_eq!(stored.end_date, "21.03.2025");

        let contract = stored.into_contract();
        assert_eq!(contract.id, 4);
        assert_eq!(contract.company_name, "Acme");
        assert_eq!(contract.end_date, "2025-03-21");
        assert_eq!(contract.comments, "vip");
        assert!(contract.has_nd);
    }

    #[test]
    fn cells_follow_column_order() {
        let row = StoredRow::from_new(
            2,
            NewContract {
                company_name: "Acme".into(),
                inn: "123".into(),
                director: "Jane".into(),
                address: "1 Main St".into(),
                end_date: "2025-01-01".into(),
                comments: String::new(),
                has_nd: true,
            },
        );

        assert_eq!(
            row.cells(),
            vec!["Acme", "123", "Jane", "1 Main St", "2025-01-01", "", "true", "2"]
        );
    }

    #[test]
    fn merge_keeps_omitted_fields() {
        let stored = StoredRow::with_id(
            &record(["Acme", "123", "Jane", "1 Main St", "21.03.2025", "note", "true", "3"]),
            3,
        );
        let merged = stored.clone().merge(ContractPatch {
            director: Some("John".into()),
            has_nd: Some(false),
            ..ContractPatch::default()
        });

        assert_eq!(merged.director, "John");
        assert!(!merged.has_nd);
        assert_eq!(merged.end_date, "21.03.2025");
        assert_eq!(merged.company_name, stored.company_name);
        assert_eq!(merged.comments, stored.comments);
        assert_eq!(merged.id, 3);
    }
}
