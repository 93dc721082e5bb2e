use crate::period::Period;
use crate::schema::SnapshotTable;
use crate::table::CategoryTable;
use chrono::NaiveDate;

/// Signed discrepancy per audited period: reconstructed balance on the last
/// reconstructed day of the period minus the audited count.
///
/// Periods without an audit, or without any reconstructed day, get no row. A category
/// the audit did not record stays `None`; a negative value is unexplained loss.
pub fn compute_shrinkage(
    balances: &CategoryTable<NaiveDate, i64>,
    snapshots: &SnapshotTable,
) -> CategoryTable<Period, Option<i64>> {
    let columns: Vec<Option<usize>> = balances
        .categories()
        .iter()
        .map(|c| snapshots.category_index(c))
        .collect();

    let mut shrinkage = CategoryTable::new(balances.categories().to_vec());
    for (period, audited) in snapshots {
        let closing = balances
            .range(period.first_day()..=period.last_day())
            .next_back();
        let Some((_, reconstructed)) = closing else {
            continue;
        };

        let row = reconstructed
            .iter()
            .zip(&columns)
            .map(|(balance, col)| col.and_then(|idx| audited[idx]).map(|a| balance - a))
            .collect();
        shrinkage.insert(*period, row);
    }
    shrinkage
}
