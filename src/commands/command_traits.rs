//! Command pattern interfaces
//!
//! This module defines the core Command pattern interfaces
//! for the CLI application.

use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::PipelineError;
use crate::raster::RasterError;

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("cannot install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Represents an executable command in the application
pub trait Command {
    /// Execute the command
    fn execute(&self) -> CommandResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory {
    /// Create the command selected by `args`
    fn create_command(&self, args: &clap::ArgMatches) -> CommandResult<Box<dyn Command>>;
}
