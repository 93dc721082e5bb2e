use crate::aggregation::UnclassifiedTally;
use crate::classify::ClassificationRule;
use crate::config::{FileLayout, ReconConfig};
use crate::error::{Result, ShrinkageError};
use crate::ingestion::load_store_inputs;
use crate::output::{write_daily_balances, write_report, write_shrinkage};
use crate::schema::UnclassifiedPolicy;
use crate::summary::{aggregate_summaries, summarize_store, CrossStoreReport, StoreSummaryRow};
use crate::{StoreReconciler, StoreReconciliation};
use log::{debug, info, log, warn, Level};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// A store, identified by the file-name prefix its three input tables share.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Store {
    prefix: String,
}

impl Store {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The prefix without its trailing separator, e.g. `MS-b1` for `MS-b1-`.
    pub fn name(&self) -> &str {
        self.prefix.trim_end_matches(['-', '_', '.', ' '])
    }

    /// The leading `len` characters of the prefix.
    pub fn category(&self, len: usize) -> String {
        self.prefix.chars().take(len).collect()
    }
}

#[derive(Debug)]
pub struct StoreReport {
    pub store: Store,
    pub reconciliation: StoreReconciliation,
    pub summary: Vec<StoreSummaryRow>,
}

#[derive(Debug)]
pub struct StoreFailure {
    pub store: Store,
    pub error: ShrinkageError,
}

/// Everything one run produced, collected by the driver.
#[derive(Debug)]
pub struct BatchOutcome {
    pub stores: Vec<StoreReport>,
    pub failures: Vec<StoreFailure>,
    pub report: CrossStoreReport,
}

/// Every regular file whose name ends in the sales suffix defines a store.
/// Stores are returned sorted by prefix.
pub fn discover_stores(input_dir: &Path, files: &FileLayout) -> Result<Vec<Store>> {
    let mut stores = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!("Skipping non UTF-8 file name {:?}", file_name);
            continue;
        };
        if let Some(prefix) = name.strip_suffix(files.sales_suffix.as_str()) {
            stores.push(Store::new(prefix));
        }
    }
    stores.sort();
    Ok(stores)
}

/// Creates the output directory, removing any previous contents first when `clean` is set.
pub fn prepare_output_dir(output_dir: &Path, clean: bool) -> Result<()> {
    if clean && output_dir.exists() {
        debug!("Removing previous output in {}", output_dir.display());
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;
    Ok(())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// The log line for a store's unrecognized codes, or `None` when there were none.
///
/// `Warn` reports at warning level with a sample of the codes; `Ignore` only at debug.
fn unclassified_notice(
    store: &str,
    tally: &UnclassifiedTally,
    policy: UnclassifiedPolicy,
) -> Option<(Level, String)> {
    if tally.count == 0 {
        return None;
    }
    Some(match policy {
        UnclassifiedPolicy::Warn => (
            Level::Warn,
            format!(
                "Store \"{}\": {} transaction(s) with unrecognized codes excluded, e.g. {:?}",
                store, tally.count, tally.sample
            ),
        ),
        UnclassifiedPolicy::Ignore => (
            Level::Debug,
            format!(
                "Store \"{}\": {} unclassified transaction(s) excluded",
                store, tally.count
            ),
        ),
    })
}

/// Writes both per-store files. If either write fails, whatever was already written
/// for the store is removed so no half-finished output is left behind.
fn write_store_outputs(
    daily_path: &Path,
    shrinkage_path: &Path,
    reconciliation: &StoreReconciliation,
) -> Result<()> {
    let written = File::create(daily_path)
        .map_err(ShrinkageError::from)
        .and_then(|f| write_daily_balances(BufWriter::new(f), &reconciliation.balances))
        .and_then(|()| {
            let f = File::create(shrinkage_path)?;
            write_shrinkage(BufWriter::new(f), &reconciliation.shrinkage)
        });

    if written.is_err() {
        for path in [daily_path, shrinkage_path] {
            if path.is_file() {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Could not remove partial output {}: {}", path.display(), e);
                }
            }
        }
    }
    written
}

/// Loads, reconciles and writes the outputs of a single store.
pub fn process_store<R: ClassificationRule>(
    store: &Store,
    config: &ReconConfig,
    reconciler: &StoreReconciler<R>,
) -> Result<StoreReport> {
    let inputs = load_store_inputs(&config.input_dir, store.prefix(), config)?;
    let reconciliation = reconciler.reconcile(&inputs);

    if let Some((level, message)) =
        unclassified_notice(store.name(), &reconciliation.unclassified, config.unclassified)
    {
        log!(level, "{}", message);
    }

    let files = &config.files;
    let output_path = |suffix: &str| -> PathBuf {
        config
            .output_dir
            .join(format!("{}{}", store.prefix(), suffix))
    };
    write_store_outputs(
        &output_path(&files.daily_suffix),
        &output_path(&files.shrinkage_suffix),
        &reconciliation,
    )?;

    let summary = summarize_store(
        &store.category(config.store_category_len),
        &reconciliation.daily_sales,
        &reconciliation.shrinkage,
    );

    Ok(StoreReport {
        store: store.clone(),
        reconciliation,
        summary,
    })
}

/// Processes every store in the input directory and writes the cross-store report.
///
/// A store that fails to load or write is logged and recorded in
/// [`BatchOutcome::failures`]; the remaining stores are unaffected. Only problems with
/// the directories themselves or the final report abort the run.
pub fn run_batch(config: &ReconConfig) -> Result<BatchOutcome> {
    config.validate()?;
    let reconciler = StoreReconciler::new(config.classifier());
    run_batch_with(config, &reconciler)
}

/// [`run_batch`] with a caller-supplied classifier.
pub fn run_batch_with<R: ClassificationRule>(
    config: &ReconConfig,
    reconciler: &StoreReconciler<R>,
) -> Result<BatchOutcome> {
    let stores = discover_stores(&config.input_dir, &config.files)?;
    if config.clean_output && same_dir(&config.input_dir, &config.output_dir) {
        return Err(ShrinkageError::InvalidConfig(format!(
            "refusing to clean output directory {} because it is also the input directory",
            config.output_dir.display()
        )));
    }
    prepare_output_dir(&config.output_dir, config.clean_output)?;
    info!(
        "Found {} store(s) in {}",
        stores.len(),
        config.input_dir.display()
    );

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for store in stores {
        info!("Processing \"{}\"", store.name());
        match process_store(&store, config, reconciler) {
            Ok(report) => reports.push(report),
            Err(error) => {
                warn!("Skipping \"{}\": {}", store.name(), error);
                failures.push(StoreFailure { store, error });
            }
        }
    }

    let rows: Vec<StoreSummaryRow> = reports
        .iter()
        .flat_map(|r| r.summary.iter().cloned())
        .collect();
    let report = aggregate_summaries(
        reconciler.classifier().categories(),
        &rows,
        config.missing_shrinkage,
    );

    let report_path = config.output_dir.join(&config.files.report_name);
    write_report(BufWriter::new(File::create(&report_path)?), &report)?;

    info!(
        "Finished: {} store(s) reconciled, {} skipped, report written to {}",
        reports.len(),
        failures.len(),
        report_path.display()
    );

    Ok(BatchOutcome {
        stores: reports,
        failures,
        report,
    })
}
