//! CSV ingestion into `Transaction`s
//!
//! Requires an `amount` column; `merchant`, `category` and `customer_id`
//! are optional. Any bad row rejects the whole file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::logic::error::IngestError;
use crate::logic::transaction::Transaction;

const AMOUNT: &str = "amount";
const MERCHANT: &str = "merchant";
const CATEGORY: &str = "category";
const CUSTOMER_ID: &str = "customer_id";

struct Columns {
    amount: usize,
    merchant: Option<usize>,
    category: Option<usize>,
    customer_id: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let amount = find(AMOUNT).ok_or_else(|| IngestError::MissingColumns(vec![AMOUNT.to_string()]))?;

        Ok(Self {
            amount,
            merchant: find(MERCHANT),
            category: find(CATEGORY),
            customer_id: find(CUSTOMER_ID),
        })
    }
}

fn optional_cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
}

fn parse_amount(raw: &str, row: usize) -> Result<f64, IngestError> {
    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(IngestError::InvalidAmount {
            row,
            value: raw.to_string(),
        }),
    }
}

/// Parse CSV with a header row into transactions, in file order.
/// `row` in errors is 1-based over data rows.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>, IngestError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(IngestError::Empty);
    }
    let columns = Columns::resolve(&headers)?;

    let mut transactions = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let amount = parse_amount(record.get(columns.amount).unwrap_or(""), row)?;
        transactions.push(Transaction {
            amount,
            merchant: optional_cell(&record, columns.merchant),
            category: optional_cell(&record, columns.category),
            customer_id: optional_cell(&record, columns.customer_id),
        });
    }

    if transactions.is_empty() {
        return Err(IngestError::Empty);
    }

    log::debug!("Ingested {} transactions", transactions.len());
    Ok(transactions)
}

pub fn read_transactions_from_path(path: &Path) -> Result<Vec<Transaction>, IngestError> {
    read_transactions(File::open(path)?)
}
