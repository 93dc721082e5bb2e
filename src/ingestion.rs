use crate::config::ReconConfig;
use crate::error::{Result, ShrinkageError};
use crate::period::Period;
use crate::schema::{RestockTable, SnapshotTable, StoreInputs, Transaction};
use crate::table::CategoryTable;
use crate::utils::{parse_date, parse_quantity};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const SALES: &str = "sales";
const SUPPLY: &str = "supply";
const INVENTORY: &str = "inventory";

fn find_column(headers: &StringRecord, table: &str, names: &[String]) -> Result<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
        .ok_or_else(|| ShrinkageError::MissingColumn {
            table: table.to_string(),
            column: names.join(" | "),
        })
}

/// The configured categories that have a column in `headers`, with their positions.
///
/// A category without a column is left out of the table; downstream it counts as
/// never delivered (supply) or never counted (inventory).
fn category_columns(
    headers: &StringRecord,
    table: &str,
    categories: &[String],
) -> Vec<(usize, String)> {
    categories
        .iter()
        .filter_map(|c| match headers.iter().position(|h| h == c) {
            Some(idx) => Some((idx, c.clone())),
            None => {
                debug!("Table '{}' has no '{}' column", table, c);
                None
            }
        })
        .collect()
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(false)
        .from_reader(source)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

pub fn read_sales<R: Read>(source: R, config: &ReconConfig) -> Result<Vec<Transaction>> {
    let mut rdr = reader(source);
    let headers = rdr.headers()?.clone();
    let date_col = find_column(&headers, SALES, std::slice::from_ref(&config.date_column))?;
    let code_col = find_column(&headers, SALES, &config.code_columns)?;

    let mut transactions = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let raw_date = record.get(date_col).unwrap_or_default();
        let date = parse_date(raw_date, &config.date_format).ok_or_else(|| {
            ShrinkageError::DateParse {
                table: SALES.to_string(),
                line: line_of(&record),
                value: raw_date.to_string(),
            }
        })?;
        let code = record.get(code_col).unwrap_or_default();
        transactions.push(Transaction::new(date, code));
    }
    Ok(transactions)
}

pub fn read_supply<R: Read>(source: R, config: &ReconConfig) -> Result<RestockTable> {
    let mut rdr = reader(source);
    let headers = rdr.headers()?.clone();
    let date_col = find_column(&headers, SUPPLY, std::slice::from_ref(&config.date_column))?;
    let columns = category_columns(&headers, SUPPLY, &config.category_names());

    let mut table = CategoryTable::new(columns.iter().map(|(_, name)| name.clone()).collect());
    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let raw_date = record.get(date_col).unwrap_or_default();
        let date = parse_date(raw_date, &config.date_format).ok_or_else(|| {
            ShrinkageError::DateParse {
                table: SUPPLY.to_string(),
                line,
                value: raw_date.to_string(),
            }
        })?;

        let mut row = Vec::with_capacity(columns.len());
        for (col, name) in &columns {
            let cell = record.get(*col).unwrap_or_default();
            // a blank delivery cell means nothing arrived
            let qty = if cell.is_empty() {
                0
            } else {
                parse_quantity(cell).ok_or_else(|| ShrinkageError::QuantityParse {
                    table: SUPPLY.to_string(),
                    line,
                    column: name.clone(),
                    value: cell.to_string(),
                })?
            };
            row.push(qty);
        }

        if table.insert(date, row).is_some() {
            return Err(ShrinkageError::DuplicateKey {
                table: SUPPLY.to_string(),
                key: date.to_string(),
            });
        }
    }
    Ok(table)
}

pub fn read_inventory<R: Read>(source: R, config: &ReconConfig) -> Result<SnapshotTable> {
    let mut rdr = reader(source);
    let headers = rdr.headers()?.clone();
    let date_col = find_column(&headers, INVENTORY, std::slice::from_ref(&config.date_column))?;
    let columns = category_columns(&headers, INVENTORY, &config.category_names());

    let mut table = CategoryTable::new(columns.iter().map(|(_, name)| name.clone()).collect());
    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let raw_date = record.get(date_col).unwrap_or_default();
        let period = parse_date(raw_date, &config.date_format)
            .map(Period::of)
            .or_else(|| raw_date.parse::<Period>().ok())
            .ok_or_else(|| ShrinkageError::DateParse {
                table: INVENTORY.to_string(),
                line,
                value: raw_date.to_string(),
            })?;

        let mut row = Vec::with_capacity(columns.len());
        for (col, name) in &columns {
            let cell = record.get(*col).unwrap_or_default();
            let count = if cell.is_empty() {
                None
            } else {
                Some(parse_quantity(cell).ok_or_else(|| ShrinkageError::QuantityParse {
                    table: INVENTORY.to_string(),
                    line,
                    column: name.clone(),
                    value: cell.to_string(),
                })?)
            };
            row.push(count);
        }

        if table.insert(period, row).is_some() {
            return Err(ShrinkageError::DuplicateKey {
                table: INVENTORY.to_string(),
                key: period.to_string(),
            });
        }
    }
    Ok(table)
}

/// Loads the three source tables of the store with file-name prefix `prefix`.
pub fn load_store_inputs(dir: &Path, prefix: &str, config: &ReconConfig) -> Result<StoreInputs> {
    let files = &config.files;
    let open = |suffix: &str| File::open(dir.join(format!("{}{}", prefix, suffix)));

    let transactions = read_sales(open(&files.sales_suffix)?, config)?;
    let restock = read_supply(open(&files.supply_suffix)?, config)?;
    let snapshots = read_inventory(open(&files.inventory_suffix)?, config)?;

    Ok(StoreInputs {
        transactions,
        restock,
        snapshots,
    })
}
