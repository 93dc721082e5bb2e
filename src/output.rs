use crate::error::Result;
use crate::period::Period;
use crate::summary::CrossStoreReport;
use crate::table::CategoryTable;
use chrono::NaiveDate;
use csv::Writer;
use std::io::Write;

const DATE_HEADER: &str = "date";
const STORE_CATEGORY_HEADER: &str = "state";

fn header_row<'a>(first: &'a str, categories: &'a [String]) -> Vec<&'a str> {
    std::iter::once(first)
        .chain(categories.iter().map(String::as_str))
        .collect()
}

/// Writes `date,<category>...` with one row per reconstructed day.
pub fn write_daily_balances<W: Write>(sink: W, balances: &CategoryTable<NaiveDate, i64>) -> Result<()> {
    let mut wtr = Writer::from_writer(sink);
    wtr.write_record(header_row(DATE_HEADER, balances.categories()))?;
    for (date, values) in balances {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(values.iter().map(i64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `date,<category>...` keyed by period (`YYYY-MM`). Missing values are left blank.
pub fn write_shrinkage<W: Write>(sink: W, shrinkage: &CategoryTable<Period, Option<i64>>) -> Result<()> {
    let mut wtr = Writer::from_writer(sink);
    wtr.write_record(header_row(DATE_HEADER, shrinkage.categories()))?;
    for (period, values) in shrinkage {
        let mut record = vec![period.to_string()];
        record.extend(
            values
                .iter()
                .map(|v| v.map(|n| n.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `year,state,<category>_sold...,<category>_stolen...`.
pub fn write_report<W: Write>(sink: W, report: &CrossStoreReport) -> Result<()> {
    let mut wtr = Writer::from_writer(sink);

    let mut header = vec!["year".to_string(), STORE_CATEGORY_HEADER.to_string()];
    header.extend(report.categories().iter().map(|c| format!("{}_sold", c)));
    header.extend(report.categories().iter().map(|c| format!("{}_stolen", c)));
    wtr.write_record(&header)?;

    for (key, totals) in report.iter() {
        let mut record = vec![key.year.to_string(), key.store_category.clone()];
        record.extend(totals.sold.iter().map(i64::to_string));
        record.extend(totals.shrinkage.iter().map(i64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
