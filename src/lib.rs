//! # Inventory Shrinkage
//!
//! Reconstructs a day-by-day inventory balance per retail store from three independent
//! records and measures how far it drifts from what was physically counted.
//!
//! ## Core Concepts
//!
//! - **Sales**: raw transactions, each classified into a product category by its code
//! - **Restock**: sparse deliveries (conventionally on the 1st and 15th of a month)
//! - **Audits**: physically counted inventory, at most one per calendar month
//! - **Reconstructed Balance**: the previous month's audited count plus the running sum
//!   of `restock - sales` since the start of the month
//! - **Shrinkage**: reconstructed balance at month end minus the audited count.
//!   Negative values are unexplained loss.
//!
//! ## Example
//!
//! ```rust,ignore
//! use inventory_shrinkage::*;
//!
//! let config = ReconConfig {
//!     input_dir: "input".into(),
//!     output_dir: "output".into(),
//!     ..ReconConfig::default()
//! };
//!
//! let outcome = run_batch(&config)?;
//! for failure in &outcome.failures {
//!     eprintln!("{}: {}", failure.store.name(), failure.error);
//! }
//! ```

pub mod aggregation;
pub mod batch;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod output;
pub mod period;
pub mod schema;
pub mod shrinkage;
pub mod summary;
pub mod table;
pub mod utils;

pub use aggregation::{aggregate_daily_sales, DailySales, UnclassifiedTally};
pub use batch::{
    discover_stores, prepare_output_dir, process_store, run_batch, run_batch_with,
    BatchOutcome, Store, StoreFailure, StoreReport,
};
pub use classify::{CharAtRule, Classification, ClassificationRule, Classifier};
pub use config::{CategoryConfig, FileLayout, ReconConfig};
pub use engine::{
    build_change_series, periods_of, reconstruct_balances, resolve_baselines,
    resolve_baselines_for,
};
pub use error::{Result, ShrinkageError};
pub use period::Period;
pub use schema::*;
pub use shrinkage::compute_shrinkage;
pub use summary::{
    aggregate_summaries, summarize_store, CrossStoreReport, ReportKey, ReportTotals,
    StoreSummaryRow,
};
pub use table::CategoryTable;

use chrono::NaiveDate;
use log::debug;

/// Every intermediate series of one store's reconciliation.
#[derive(Debug, Clone)]
pub struct StoreReconciliation {
    pub daily_sales: CategoryTable<NaiveDate, i64>,
    pub changes: CategoryTable<NaiveDate, i64>,
    pub baselines: CategoryTable<Period, i64>,
    pub balances: CategoryTable<NaiveDate, i64>,
    pub shrinkage: CategoryTable<Period, Option<i64>>,
    pub unclassified: UnclassifiedTally,
}

/// Runs the per-store pipeline: classify, aggregate, difference, re-base, compare.
///
/// Pure and infallible; loading and writing happen in [`batch`].
pub struct StoreReconciler<R> {
    classifier: Classifier<R>,
}

impl<R: ClassificationRule> StoreReconciler<R> {
    pub fn new(classifier: Classifier<R>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier<R> {
        &self.classifier
    }

    pub fn reconcile(&self, inputs: &StoreInputs) -> StoreReconciliation {
        let DailySales {
            counts: daily_sales,
            unclassified,
        } = aggregate_daily_sales(&inputs.transactions, &self.classifier);

        let changes = build_change_series(&daily_sales, &inputs.restock);
        let periods = periods_of(&changes);
        let baselines = resolve_baselines_for(changes.categories(), &inputs.snapshots, &periods);
        let balances = reconstruct_balances(&changes, &baselines);
        let shrinkage = compute_shrinkage(&balances, &inputs.snapshots);

        debug!(
            "Reconciled {} day(s) over {} period(s); {} audited period(s) compared",
            balances.len(),
            periods.len(),
            shrinkage.len()
        );

        StoreReconciliation {
            daily_sales,
            changes,
            baselines,
            balances,
            shrinkage,
            unclassified,
        }
    }
}

/// Reconciles one store with the classifier described by `config`.
pub fn reconcile_store(inputs: &StoreInputs, config: &ReconConfig) -> StoreReconciliation {
    StoreReconciler::new(config.classifier()).reconcile(inputs)
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

    fn tx(d: NaiveDate, marker: char) -> Transaction {
        Transaction::new(d, format!("MS-b1-{}-0001", marker))
    }

    #[test]
    fn test_single_day_scenario() {
        // prior month audit gives the baseline; this month's audit is the ground truth
        let day1 = date(2006, 2, 1);
        let mut transactions = vec![tx(day1, 'a'), tx(day1, 'a'), tx(day1, 'a')];
        transactions.extend([tx(day1, 'p'), tx(day1, 'p')]);

        let mut restock = CategoryTable::new(cats());
        restock.insert(day1, vec![5, 0]);

        let mut snapshots = CategoryTable::new(cats());
        snapshots.insert(Period::new(2006, 1).unwrap(), vec![Some(8), Some(1)]);
        snapshots.insert(Period::new(2006, 2).unwrap(), vec![Some(10), Some(0)]);

        let inputs = StoreInputs {
            transactions,
            restock,
            snapshots,
        };
        let result = reconcile_store(&inputs, &ReconConfig::default());

        assert_eq!(result.balances.get(&day1), Some(&[10, -1][..]));
        let feb = Period::new(2006, 2).unwrap();
        assert_eq!(result.shrinkage.get(&feb), Some(&[Some(0), Some(-1)][..]));
        // January has an audit but no reconstructed day
        assert_eq!(result.shrinkage.len(), 1);
    }

    #[test]
    fn test_unclassified_codes_do_not_move_balances() {
        let day1 = date(2006, 1, 3);
        let inputs = StoreInputs {
            transactions: vec![tx(day1, 'a'), tx(day1, 'z'), Transaction::new(day1, "bad")],
            restock: CategoryTable::new(cats()),
            snapshots: CategoryTable::new(cats()),
        };
        let result = reconcile_store(&inputs, &ReconConfig::default());
        assert_eq!(result.balances.get(&day1), Some(&[-1, 0][..]));
        assert_eq!(result.unclassified.count, 2);
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let inputs = StoreInputs {
            transactions: vec![
                tx(date(2006, 1, 2), 'a'),
                tx(date(2006, 1, 1), 'p'),
                tx(date(2006, 2, 2), 'a'),
            ],
            restock: CategoryTable::new(cats()),
            snapshots: CategoryTable::new(cats()),
        };
        let config = ReconConfig::default();
        let a = reconcile_store(&inputs, &config);
        let b = reconcile_store(&inputs, &config);
        assert_eq!(a.balances, b.balances);
        assert_eq!(a.shrinkage, b.shrinkage);
    }
}
