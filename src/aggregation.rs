use crate::classify::{Classification, ClassificationRule, Classifier};
use crate::schema::Transaction;
use crate::table::CategoryTable;
use chrono::NaiveDate;
use std::collections::BTreeMap;

const UNCLASSIFIED_SAMPLE_SIZE: usize = 5;

/// Transactions that matched no category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnclassifiedTally {
    pub count: usize,
    /// The first few distinct codes seen, for diagnostics.
    pub sample: Vec<String>,
}

impl UnclassifiedTally {
    fn record(&mut self, code: &str) {
        self.count += 1;
        if self.sample.len() < UNCLASSIFIED_SAMPLE_SIZE && !self.sample.iter().any(|c| c == code) {
            self.sample.push(code.to_string());
        }
    }
}

#[derive(Debug, Clone)]
pub struct DailySales {
    pub counts: CategoryTable<NaiveDate, i64>,
    pub unclassified: UnclassifiedTally,
}

/// Counts sales per category per day.
///
/// Every transaction date gets a row, even when none of that day's codes were
/// recognized.
pub fn aggregate_daily_sales<R: ClassificationRule>(
    transactions: &[Transaction],
    classifier: &Classifier<R>,
) -> DailySales {
    let width = classifier.categories().len();
    let mut days: BTreeMap<NaiveDate, Vec<i64>> = BTreeMap::new();
    let mut unclassified = UnclassifiedTally::default();

    for tx in transactions {
        let row = days.entry(tx.date).or_insert_with(|| vec![0; width]);
        match classifier.classify(&tx.code) {
            Classification::Known(idx) => row[idx] += 1,
            Classification::Unrecognized => unclassified.record(&tx.code),
        }
    }

    let mut counts = CategoryTable::new(classifier.categories().to_vec());
    for (date, row) in days {
        counts.insert(date, row);
    }

    DailySales {
        counts,
        unclassified,
    }
}
