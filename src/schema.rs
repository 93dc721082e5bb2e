use crate::period::Period;
use crate::table::CategoryTable;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A raw sales transaction as read from the sales table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub code: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, code: impl Into<String>) -> Self {
        Self {
            date,
            code: code.into(),
        }
    }
}

/// Restock deliveries per day. Sparse: days without deliveries are absent.
pub type RestockTable = CategoryTable<NaiveDate, i64>;

/// Physically counted inventory per reporting period. A `None` cell is a count
/// that was not recorded for that category.
pub type SnapshotTable = CategoryTable<Period, Option<i64>>;

/// The three source tables of one store.
#[derive(Debug, Clone)]
pub struct StoreInputs {
    pub transactions: Vec<Transaction>,
    pub restock: RestockTable,
    pub snapshots: SnapshotTable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnclassifiedPolicy {
    #[default]
    #[schemars(
        description = "Drop transactions whose code matches no category. Counts are logged at debug level only."
    )]
    Ignore,

    #[schemars(
        description = "Drop unclassified transactions but emit a warning per store with the count and a sample of codes."
    )]
    Warn,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingShrinkagePolicy {
    #[default]
    #[schemars(
        description = "Periods without an audited count still contribute their sales; their missing shrinkage adds nothing to the sum."
    )]
    Zero,

    #[schemars(
        description = "Periods with any missing shrinkage value are left out of the cross-store sum entirely, sales included."
    )]
    ExcludeRow,
}
