//! Extraction pipeline
//!
//! One producer walks the catalog and submits a [`task::run_file_task`]
//! per raster to a bounded [`pool::WorkerPool`]. The same thread drains the
//! results in submission order into the CSV writer.

pub mod pool;
pub mod scheduler;
pub mod summary;
pub mod task;

pub use pool::{PoolError, TaskError, TaskHandle, WorkerPool};
pub use scheduler::{CancellationToken, ScheduleReport, Scheduler};
pub use summary::RunSummary;
pub use task::{run_file_task, ExtractedRecord, FileOutcome, FileRecords, SkipReason};

use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::config::{ConfigError, PipelineConfig};
use crate::output::CsvRecordWriter;
use crate::utils::progress::ProgressTracker;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("cannot create output {}: {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed writing output: {0}")]
    OutputWrite(#[source] csv::Error),
}

/// A configured extraction run
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validates `config`
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extracts the whole catalog into the configured CSV file
    pub fn run(&self, cancel: &CancellationToken) -> Result<RunSummary, PipelineError> {
        let catalog = Catalog::new(&self.config.root, &self.config.catalog_options())?;
        let mut writer = CsvRecordWriter::create(&self.config.output)
            .map_err(|source| PipelineError::OutputCreate { path: self.config.output.clone(), source })?;
        info!("Writing points to {}", self.config.output.display());

        self.execute(&catalog, &mut writer, cancel)
    }

    /// Extracts the whole catalog into `writer`
    pub fn run_into<W: Write>(&self, writer: &mut CsvRecordWriter<W>,
                              cancel: &CancellationToken) -> Result<RunSummary, PipelineError> {
        let catalog = Catalog::new(&self.config.root, &self.config.catalog_options())?;
        self.execute(&catalog, writer, cancel)
    }

    fn execute<W: Write>(&self, catalog: &Catalog, writer: &mut CsvRecordWriter<W>,
                         cancel: &CancellationToken) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        let pool = WorkerPool::new(self.config.workers)?;
        let scheduler = Scheduler::new(&pool, self.config.queue_depth(), cancel.clone());
        let progress = ProgressTracker::new(self.config.progress);
        let options = self.config.accessor_options();
        let mut summary = RunSummary::default();

        info!("Extracting {} with {} workers, queue depth {}, block size {}",
              catalog.root().display(), pool.workers(), scheduler.queue_depth(), options.block_size);

        let files = catalog.files().filter_map(|entry| match entry {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("Skipping catalog entry: {}", e);
                None
            }
        });

        let report = scheduler.run(
            files,
            move |index, file| run_file_task(index, file, &options),
            |index, file, result| -> Result<(), PipelineError> {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Skipping {}: {}", file, e);
                        FileOutcome::skipped(index, file, SkipReason::Crashed(e))
                    }
                };

                let rows = writer.write_result(&outcome).map_err(PipelineError::OutputWrite)?;
                summary.record(&outcome, rows);

                progress.set_message(&format!("{}/{}", outcome.file.category, outcome.file.year));
                progress.increment(1);
                Ok(())
            },
        )?;

        summary.cancelled = report.cancelled;
        summary.elapsed = started.elapsed();
        progress.finish(&summary.to_string());
        info!("{}", summary);

        Ok(summary)
    }
}
