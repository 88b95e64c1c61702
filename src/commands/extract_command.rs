//! Catalog extraction command
//!
//! Builds the pipeline configuration from defaults, the optional config
//! file and the command-line flags, then runs the pipeline with Ctrl-C
//! wired to cancellation.

use clap::ArgMatches;
use log::{info, warn};
use std::path::PathBuf;

use crate::commands::command_traits::{Command, CommandError, CommandResult};
use crate::config::{parse_extension_list, PipelineConfig};
use crate::pipeline::{CancellationToken, Pipeline};

/// Command for extracting a whole catalog into CSV
pub struct ExtractCommand {
    config: PipelineConfig,
}

impl ExtractCommand {
    /// Create a new extract command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    ///
    /// # Returns
    /// A new ExtractCommand instance or an error
    pub fn new(args: &ArgMatches) -> CommandResult<Self> {
        let root = args.get_one::<PathBuf>("root")
            .ok_or_else(|| CommandError::Usage("missing catalog ROOT directory".to_string()))?;
        let mut config = PipelineConfig::new(root.clone());

        if let Some(path) = args.get_one::<PathBuf>("config") {
            info!("Reading configuration from {}", path.display());
            config.load_file(path)?;
        }

        apply_overrides(&mut config, args);
        config.validate()?;
        info!("Configuration: {:?}", config);

        Ok(ExtractCommand { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut PipelineConfig, args: &ArgMatches) {
    if let Some(output) = args.get_one::<PathBuf>("output") {
        config.output = output.clone();
    }
    if let Some(&workers) = args.get_one::<usize>("workers") {
        config.workers = workers;
    }
    if let Some(&block_size) = args.get_one::<u32>("block-size") {
        config.block_size = block_size;
    }
    if let Some(&queue_depth) = args.get_one::<usize>("queue-depth") {
        config.queue_depth = Some(queue_depth);
    }
    if let Some(list) = args.get_one::<String>("extensions") {
        config.extensions = parse_extension_list(list);
    }
    if args.get_flag("no-progress") {
        config.progress = false;
    }
}

impl Command for ExtractCommand {
    fn execute(&self) -> CommandResult<()> {
        let pipeline = Pipeline::new(self.config.clone())?;

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupted, finishing the files already submitted");
            interrupt.cancel();
        })?;

        let summary = pipeline.run(&cancel)?;
        println!("{}", summary);
        Ok(())
    }
}
