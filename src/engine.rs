use crate::period::Period;
use crate::schema::{RestockTable, SnapshotTable};
use crate::table::CategoryTable;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

/// Net daily change per category: `restock - sales`, on exactly the sales date index.
///
/// Restock days with no sales row are dropped; sales days with no restock row count as
/// zero delivery. Restock columns are matched to sales columns by name, and a category
/// the restock table lacks is treated as never delivered.
pub fn build_change_series(
    sales: &CategoryTable<NaiveDate, i64>,
    restock: &RestockTable,
) -> CategoryTable<NaiveDate, i64> {
    let columns: Vec<Option<usize>> = sales
        .categories()
        .iter()
        .map(|c| restock.category_index(c))
        .collect();

    let dropped = restock.keys().filter(|d| !sales.contains_key(d)).count();
    if dropped > 0 {
        debug!(
            "{} restock day(s) fall outside the sales date index and are ignored",
            dropped
        );
    }

    let mut changes = CategoryTable::new(sales.categories().to_vec());
    for (date, sold) in sales {
        let delivered = restock.get(date);
        let row = sold
            .iter()
            .zip(&columns)
            .map(|(&s, col)| {
                let d = match (delivered, col) {
                    (Some(row), Some(idx)) => row[*idx],
                    _ => 0,
                };
                d - s
            })
            .collect();
        changes.insert(*date, row);
    }
    changes
}

/// The ordered set of reporting periods touched by a daily series.
pub fn periods_of<V: Clone>(series: &CategoryTable<NaiveDate, V>) -> Vec<Period> {
    series
        .keys()
        .map(Period::of)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Opening balance per period: for each category, the latest snapshot value recorded
/// for a period strictly earlier than the one being resolved, or zero when there is
/// none. A period's own snapshot is never its baseline.
pub fn resolve_baselines(snapshots: &SnapshotTable, periods: &[Period]) -> CategoryTable<Period, i64> {
    resolve_baselines_for(snapshots.categories(), snapshots, periods)
}

/// Like [`resolve_baselines`], but laid out on `categories` so the result lines up with
/// a change series. Categories the snapshot table lacks start from zero.
pub fn resolve_baselines_for(
    categories: &[String],
    snapshots: &SnapshotTable,
    periods: &[Period],
) -> CategoryTable<Period, i64> {
    let columns: Vec<Option<usize>> = categories
        .iter()
        .map(|c| snapshots.category_index(c))
        .collect();

    let mut sorted: Vec<Period> = periods.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut carried: Vec<Option<i64>> = vec![None; categories.len()];
    let mut history = snapshots.iter().peekable();
    let mut baselines = CategoryTable::new(categories.to_vec());

    for period in sorted {
        while let Some((_, row)) = history.next_if(|(p, _)| **p < period) {
            for (slot, col) in carried.iter_mut().zip(&columns) {
                if let Some(value) = col.and_then(|idx| row[idx]) {
                    *slot = Some(value);
                }
            }
        }
        baselines.insert(period, carried.iter().map(|v| v.unwrap_or(0)).collect());
    }
    baselines
}

/// Running balance per day: the period's baseline plus the cumulative change since the
/// first day of that period. The running sum restarts at every period boundary.
pub fn reconstruct_balances(
    changes: &CategoryTable<NaiveDate, i64>,
    baselines: &CategoryTable<Period, i64>,
) -> CategoryTable<NaiveDate, i64> {
    let width = changes.categories().len();
    let columns: Vec<Option<usize>> = changes
        .categories()
        .iter()
        .map(|c| baselines.category_index(c))
        .collect();

    let mut balances = CategoryTable::new(changes.categories().to_vec());
    let mut current: Option<Period> = None;
    let mut running = vec![0i64; width];
    let mut opening = vec![0i64; width];

    for (date, change) in changes {
        let period = Period::of(*date);
        if current != Some(period) {
            current = Some(period);
            running.iter_mut().for_each(|v| *v = 0);
            let base = baselines.get(&period);
            for (slot, col) in opening.iter_mut().zip(&columns) {
                *slot = match (base, col) {
                    (Some(row), Some(idx)) => row[*idx],
                    _ => 0,
                };
            }
        }

        for (sum, delta) in running.iter_mut().zip(change) {
            *sum += delta;
        }
        let row = opening.iter().zip(&running).map(|(b, r)| b + r).collect();
        balances.insert(*date, row);
    }
    balances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats() -> Vec<String> {
        vec!["apple".to_string(), "pen".to_string()]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(y: i32, m: u32) -> Period {
        Period::new(y, m).unwrap()
    }

    fn daily(rows: &[(NaiveDate, [i64; 2])]) -> CategoryTable<NaiveDate, i64> {
        let mut table = CategoryTable::new(cats());
        for (d, v) in rows {
            table.insert(*d, v.to_vec());
        }
        table
    }

    fn snapshots(rows: &[(Period, [Option<i64>; 2])]) -> SnapshotTable {
        let mut table = CategoryTable::new(cats());
        for (p, v) in rows {
            table.insert(*p, v.to_vec());
        }
        table
    }

    #[test]
    fn test_change_is_restock_minus_sales() {
        let sales = daily(&[(date(2006, 1, 1), [3, 2]), (date(2006, 1, 2), [1, 1])]);
        let restock = daily(&[(date(2006, 1, 1), [5, 0])]);
        let changes = build_change_series(&sales, &restock);

        assert_eq!(changes.get(&date(2006, 1, 1)), Some(&[2, -2][..]));
        assert_eq!(changes.get(&date(2006, 1, 2)), Some(&[-1, -1][..]));
    }

    #[test]
    fn test_restock_outside_sales_index_is_dropped() {
        let sales = daily(&[(date(2006, 1, 2), [1, 0])]);
        let restock = daily(&[
            (date(2006, 1, 1), [100, 100]),
            (date(2006, 1, 15), [50, 50]),
        ]);
        let changes = build_change_series(&sales, &restock);

        let keys: Vec<NaiveDate> = changes.keys().collect();
        assert_eq!(keys, vec![date(2006, 1, 2)]);
        assert_eq!(changes.get(&date(2006, 1, 2)), Some(&[-1, 0][..]));
    }

    #[test]
    fn test_restock_columns_matched_by_name() {
        let sales = daily(&[(date(2006, 1, 1), [0, 0])]);
        let mut restock = CategoryTable::new(vec!["pen".to_string(), "apple".to_string()]);
        restock.insert(date(2006, 1, 1), vec![7, 4]);
        let changes = build_change_series(&sales, &restock);
        assert_eq!(changes.get(&date(2006, 1, 1)), Some(&[4, 7][..]));
    }

    #[test]
    fn test_baseline_is_previous_period_snapshot() {
        let snaps = snapshots(&[
            (period(2006, 1), [Some(10), Some(20)]),
            (period(2006, 2), [Some(11), Some(21)]),
        ]);
        let periods = vec![period(2006, 1), period(2006, 2), period(2006, 3)];
        let baselines = resolve_baselines(&snaps, &periods);

        assert_eq!(baselines.get(&period(2006, 1)), Some(&[0, 0][..]));
        assert_eq!(baselines.get(&period(2006, 2)), Some(&[10, 20][..]));
        assert_eq!(baselines.get(&period(2006, 3)), Some(&[11, 21][..]));
    }

    #[test]
    fn test_baseline_forward_fills_gaps() {
        let snaps = snapshots(&[(period(2006, 1), [Some(10), Some(20)])]);
        let periods = vec![period(2006, 2), period(2006, 5), period(2007, 1)];
        let baselines = resolve_baselines(&snaps, &periods);

        for p in &periods {
            assert_eq!(baselines.get(p), Some(&[10, 20][..]));
        }
    }

    #[test]
    fn test_baseline_uses_snapshot_of_period_absent_from_axis() {
        // February has an audit but no sales; March still opens from it
        let snaps = snapshots(&[
            (period(2006, 1), [Some(1), Some(1)]),
            (period(2006, 2), [Some(9), Some(8)]),
        ]);
        let baselines = resolve_baselines(&snaps, &[period(2006, 1), period(2006, 3)]);
        assert_eq!(baselines.get(&period(2006, 3)), Some(&[9, 8][..]));
    }

    #[test]
    fn test_baseline_fills_missing_cells_per_category() {
        let snaps = snapshots(&[
            (period(2006, 1), [Some(10), Some(20)]),
            (period(2006, 2), [Some(11), None]),
        ]);
        let baselines = resolve_baselines(&snaps, &[period(2006, 3)]);
        assert_eq!(baselines.get(&period(2006, 3)), Some(&[11, 20][..]));
    }

    #[test]
    fn test_cumulative_sum_resets_each_period() {
        let changes = daily(&[
            (date(2006, 1, 1), [5, 1]),
            (date(2006, 1, 20), [-2, 1]),
            (date(2006, 2, 1), [3, 0]),
            (date(2006, 2, 2), [-1, -1]),
        ]);
        let mut baselines = CategoryTable::new(cats());
        baselines.insert(period(2006, 1), vec![0, 0]);
        baselines.insert(period(2006, 2), vec![100, 200]);

        let balances = reconstruct_balances(&changes, &baselines);
        assert_eq!(balances.get(&date(2006, 1, 1)), Some(&[5, 1][..]));
        assert_eq!(balances.get(&date(2006, 1, 20)), Some(&[3, 2][..]));
        // not 3 + 3: the running sum starts over in February
        assert_eq!(balances.get(&date(2006, 2, 1)), Some(&[103, 200][..]));
        assert_eq!(balances.get(&date(2006, 2, 2)), Some(&[102, 199][..]));
    }

    #[test]
    fn test_reconstruction_keeps_date_index() {
        let changes = daily(&[(date(2006, 1, 3), [1, 1]), (date(2006, 4, 9), [1, 1])]);
        let baselines = resolve_baselines(&snapshots(&[]), &periods_of(&changes));
        let balances = reconstruct_balances(&changes, &baselines);
        let a: Vec<NaiveDate> = changes.keys().collect();
        let b: Vec<NaiveDate> = balances.keys().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_periods_of_is_sorted_and_unique() {
        let changes = daily(&[
            (date(2006, 2, 1), [0, 0]),
            (date(2006, 2, 9), [0, 0]),
            (date(2005, 12, 31), [0, 0]),
        ]);
        assert_eq!(periods_of(&changes), vec![period(2005, 12), period(2006, 2)]);
    }
}
