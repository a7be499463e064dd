//! Parallel ingestion of one upload batch.
//!
//! One parse task per input, joined before aggregation. Failures are kept
//! next to successes instead of aborting the batch.

use std::path::PathBuf;

use aiadminka_io_xlsx::{
    SpecRawSheet, XlsxIoError, derive_raw_sheet_from_ipc_bytes, read_raw_sheet,
};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

/// One successfully parsed input.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecLoadedFile {
    /// Input path, or a synthetic label for in-memory payloads.
    pub path: PathBuf,
    /// Parsed grid.
    pub sheet: SpecRawSheet,
}

/// One input that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecParseFailure {
    /// Input path or label.
    pub path: PathBuf,
    /// Decoder message.
    pub message: String,
}

/// Outcome of one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecIngestBatch {
    pub loaded: Vec<SpecLoadedFile>,
    pub failures: Vec<SpecParseFailure>,
    /// Batch-level warnings (one per failure plus pool fallbacks).
    pub warnings: Vec<String>,
}

impl SpecIngestBatch {
    /// Parsed grids in input order.
    pub fn sheets(&self) -> Vec<SpecRawSheet> {
        self.loaded.iter().map(|f| f.sheet.clone()).collect()
    }

    fn push_result(&mut self, path: PathBuf, res_parse: Result<SpecRawSheet, XlsxIoError>) {
        match res_parse {
            Ok(sheet) => self.loaded.push(SpecLoadedFile { path, sheet }),
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(path = %path.display(), error = %message, "input skipped");
                self.warnings
                    .push(format!("Skipped {}: {message}", path.display()));
                self.failures.push(SpecParseFailure { path, message });
            }
        }
    }
}

/// Effective worker count; `None` means available parallelism.
pub fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu,
    }
}

/// Run `parse` over `items` on a bounded pool, keeping input order.
fn run_parse_tasks<T, F>(
    items: &[T],
    num_workers_max: Option<usize>,
    parse: F,
) -> (Vec<Result<SpecRawSheet, XlsxIoError>>, Option<String>)
where
    T: Sync,
    F: Fn(&T) -> Result<SpecRawSheet, XlsxIoError> + Sync + Send,
{
    let n_workers_max = calculate_worker_limit(num_workers_max);
    if n_workers_max <= 1 || items.len() <= 1 {
        return (items.iter().map(&parse).collect(), None);
    }

    let thread_pool = ThreadPoolBuilder::new().num_threads(n_workers_max).build();
    let Ok(thread_pool) = thread_pool else {
        let c_warning = format!(
            "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial parse."
        );
        tracing::warn!("{c_warning}");
        return (items.iter().map(&parse).collect(), Some(c_warning));
    };

    let l_results = thread_pool.install(|| items.par_iter().map(&parse).collect());
    (l_results, None)
}

/// Parse every file of a batch.
pub fn ingest_files(paths: &[PathBuf], num_workers_max: Option<usize>) -> SpecIngestBatch {
    let (l_results, warning_pool) =
        run_parse_tasks(paths, num_workers_max, |path| read_raw_sheet(path));

    let mut batch = SpecIngestBatch::default();
    batch.warnings.extend(warning_pool);
    for (path, res_parse) in paths.iter().zip(l_results) {
        batch.push_result(path.clone(), res_parse);
    }
    tracing::info!(
        files = paths.len(),
        loaded = batch.loaded.len(),
        failed = batch.failures.len(),
        "batch ingested"
    );
    batch
}

/// Parse a batch of Polars IPC payloads; inputs are labelled `ipc[<idx>]`.
pub fn ingest_ipc_payloads(
    payloads: &[Vec<u8>],
    num_workers_max: Option<usize>,
) -> SpecIngestBatch {
    let (l_results, warning_pool) = run_parse_tasks(payloads, num_workers_max, |v_ipc| {
        derive_raw_sheet_from_ipc_bytes(v_ipc)
    });

    let mut batch = SpecIngestBatch::default();
    batch.warnings.extend(warning_pool);
    for (idx, res_parse) in l_results.into_iter().enumerate() {
        batch.push_result(PathBuf::from(format!("ipc[{idx}]")), res_parse);
    }
    tracing::info!(
        payloads = payloads.len(),
        loaded = batch.loaded.len(),
        failed = batch.failures.len(),
        "ipc batch ingested"
    );
    batch
}
