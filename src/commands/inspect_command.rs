//! Raster structure inspection command

use clap::ArgMatches;
use std::path::PathBuf;

use crate::commands::command_traits::{Command, CommandError, CommandResult};
use crate::raster::{AccessorOptions, RasterHandle};

/// Prints the layout, georeferencing and window grid of one raster
pub struct InspectCommand {
    path: PathBuf,
    options: AccessorOptions,
}

impl InspectCommand {
    pub fn new(args: &ArgMatches) -> CommandResult<Self> {
        let path = args.get_one::<PathBuf>("inspect")
            .ok_or_else(|| CommandError::Usage("missing raster to inspect".to_string()))?
            .clone();

        let mut options = AccessorOptions::default();
        if let Some(&block_size) = args.get_one::<u32>("block-size") {
            options.block_size = block_size;
        }

        Ok(InspectCommand { path, options })
    }
}

impl Command for InspectCommand {
    fn execute(&self) -> CommandResult<()> {
        let handle = RasterHandle::open(&self.path, &self.options)?;
        println!("{}", handle.describe());
        Ok(())
    }
}
