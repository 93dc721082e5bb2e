use crate::period::Period;
use crate::schema::MissingShrinkagePolicy;
use crate::table::CategoryTable;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One store's figures for one reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSummaryRow {
    pub store_category: String,
    pub period: Period,
    /// Units sold per category during the period.
    pub sold: Vec<i64>,
    /// Shrinkage per category; `None` where no audit covers the period.
    pub shrinkage: Vec<Option<i64>>,
}

impl StoreSummaryRow {
    pub fn year(&self) -> i32 {
        self.period.year()
    }

    pub fn has_missing_shrinkage(&self) -> bool {
        self.shrinkage.iter().any(Option::is_none)
    }
}

/// Monthly sales totals joined with shrinkage by period key.
pub fn summarize_store(
    store_category: &str,
    sales: &CategoryTable<NaiveDate, i64>,
    shrinkage: &CategoryTable<Period, Option<i64>>,
) -> Vec<StoreSummaryRow> {
    let width = sales.categories().len();
    let mut monthly: BTreeMap<Period, Vec<i64>> = BTreeMap::new();
    for (date, counts) in sales {
        let total = monthly
            .entry(Period::of(*date))
            .or_insert_with(|| vec![0; width]);
        for (t, c) in total.iter_mut().zip(counts) {
            *t += c;
        }
    }

    let columns: Vec<Option<usize>> = sales
        .categories()
        .iter()
        .map(|c| shrinkage.category_index(c))
        .collect();

    monthly
        .into_iter()
        .map(|(period, sold)| {
            let audited = shrinkage.get(&period);
            let cells = columns
                .iter()
                .map(|col| match (audited, col) {
                    (Some(row), Some(idx)) => row[*idx],
                    _ => None,
                })
                .collect();
            StoreSummaryRow {
                store_category: store_category.to_string(),
                period,
                sold,
                shrinkage: cells,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportKey {
    pub year: i32,
    pub store_category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportTotals {
    pub sold: Vec<i64>,
    pub shrinkage: Vec<i64>,
}

/// Sales and shrinkage summed over every store, grouped by year and store category.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossStoreReport {
    categories: Vec<String>,
    groups: BTreeMap<ReportKey, ReportTotals>,
}

impl CrossStoreReport {
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn get(&self, year: i32, store_category: &str) -> Option<&ReportTotals> {
        self.groups.get(&ReportKey {
            year,
            store_category: store_category.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReportKey, &ReportTotals)> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Reduces the complete set of summary rows into the cross-store report.
///
/// Missing shrinkage is handled according to `policy`: with `Zero` it adds nothing
/// while the row's sales still count, with `ExcludeRow` the whole row is skipped.
pub fn aggregate_summaries(
    categories: &[String],
    rows: &[StoreSummaryRow],
    policy: MissingShrinkagePolicy,
) -> CrossStoreReport {
    let width = categories.len();
    let mut groups: BTreeMap<ReportKey, ReportTotals> = BTreeMap::new();

    for row in rows {
        if policy == MissingShrinkagePolicy::ExcludeRow && row.has_missing_shrinkage() {
            continue;
        }

        let totals = groups
            .entry(ReportKey {
                year: row.year(),
                store_category: row.store_category.clone(),
            })
            .or_insert_with(|| ReportTotals {
                sold: vec![0; width],
                shrinkage: vec![0; width],
            });

        for (t, v) in totals.sold.iter_mut().zip(&row.sold) {
            *t += v;
        }
        for (t, v) in totals.shrinkage.iter_mut().zip(&row.shrinkage) {
            *t += v.unwrap_or(0);
        }
    }

    CrossStoreReport {
        categories: categories.to_vec(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats() -> Vec<String> {
        vec!["apple".to_string(), "pen".to_string()]
    }

    fn period(y: i32, m: u32) -> Period {
        Period::new(y, m).unwrap()
    }

    fn row(tag: &str, p: Period, sold: [i64; 2], shrinkage: [Option<i64>; 2]) -> StoreSummaryRow {
        StoreSummaryRow {
            store_category: tag.to_string(),
            period: p,
            sold: sold.to_vec(),
            shrinkage: shrinkage.to_vec(),
        }
    }

    #[test]
    fn test_summarize_joins_by_period_not_position() {
        let mut sales = CategoryTable::new(cats());
        sales.insert(NaiveDate::from_ymd_opt(2006, 1, 2).unwrap(), vec![1, 2]);
        sales.insert(NaiveDate::from_ymd_opt(2006, 1, 9).unwrap(), vec![3, 0]);
        sales.insert(NaiveDate::from_ymd_opt(2006, 2, 1).unwrap(), vec![5, 5]);

        // only February was audited
        let mut shrinkage = CategoryTable::new(cats());
        shrinkage.insert(period(2006, 2), vec![Some(-1), Some(0)]);

        let rows = summarize_store("MS", &sales, &shrinkage);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period, period(2006, 1));
        assert_eq!(rows[0].sold, vec![4, 2]);
        assert_eq!(rows[0].shrinkage, vec![None, None]);
        assert_eq!(rows[1].sold, vec![5, 5]);
        assert_eq!(rows[1].shrinkage, vec![Some(-1), Some(0)]);
        assert_eq!(rows[1].year(), 2006);
    }

    #[test]
    fn test_aggregation_is_additive_per_group() {
        let rows = vec![
            row("MS", period(2006, 1), [1, 2], [Some(-1), Some(0)]),
            row("MS", period(2006, 2), [3, 4], [Some(-2), Some(-1)]),
            row("CA", period(2006, 1), [10, 10], [Some(0), Some(0)]),
            row("MS", period(2007, 1), [7, 7], [Some(1), Some(1)]),
        ];
        let report = aggregate_summaries(&cats(), &rows, MissingShrinkagePolicy::Zero);

        assert_eq!(report.len(), 3);
        let ms_2006 = report.get(2006, "MS").unwrap();
        assert_eq!(ms_2006.sold, vec![4, 6]);
        assert_eq!(ms_2006.shrinkage, vec![-3, -1]);
        assert_eq!(report.get(2006, "CA").unwrap().sold, vec![10, 10]);
        assert_eq!(report.get(2007, "MS").unwrap().shrinkage, vec![1, 1]);
    }

    #[test]
    fn test_report_is_ordered_by_year_then_tag() {
        let rows = vec![
            row("MS", period(2007, 1), [1, 1], [None, None]),
            row("MS", period(2006, 1), [1, 1], [None, None]),
            row("CA", period(2007, 1), [1, 1], [None, None]),
        ];
        let report = aggregate_summaries(&cats(), &rows, MissingShrinkagePolicy::Zero);
        let keys: Vec<(i32, &str)> = report
            .iter()
            .map(|(k, _)| (k.year, k.store_category.as_str()))
            .collect();
        assert_eq!(keys, vec![(2006, "MS"), (2007, "CA"), (2007, "MS")]);
    }

    #[test]
    fn test_missing_shrinkage_policies() {
        let rows = vec![
            row("MS", period(2006, 1), [5, 5], [None, None]),
            row("MS", period(2006, 2), [1, 1], [Some(-2), Some(-1)]),
        ];

        let zero = aggregate_summaries(&cats(), &rows, MissingShrinkagePolicy::Zero);
        let totals = zero.get(2006, "MS").unwrap();
        assert_eq!(totals.sold, vec![6, 6]);
        assert_eq!(totals.shrinkage, vec![-2, -1]);

        let excluded = aggregate_summaries(&cats(), &rows, MissingShrinkagePolicy::ExcludeRow);
        let totals = excluded.get(2006, "MS").unwrap();
        assert_eq!(totals.sold, vec![1, 1]);
        assert_eq!(totals.shrinkage, vec![-2, -1]);
    }

    #[test]
    fn test_exclude_row_can_drop_whole_group() {
        let rows = vec![row("TX", period(2006, 1), [5, 5], [Some(0), None])];
        let report = aggregate_summaries(&cats(), &rows, MissingShrinkagePolicy::ExcludeRow);
        assert!(report.is_empty());
    }
}
