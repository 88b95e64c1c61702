//! CLI command implementations
//!
//! This module contains implementations of the commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod extract_command;
pub mod inspect_command;

pub use command_traits::{Command, CommandError, CommandFactory, CommandResult};
pub use extract_command::ExtractCommand;
pub use inspect_command::InspectCommand;

use clap::ArgMatches;

/// Picks the command for the parsed arguments
///
/// `--inspect` selects [`InspectCommand`]; everything else is an extraction run.
#[derive(Debug, Default)]
pub struct GridpointsCommandFactory;

impl GridpointsCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        GridpointsCommandFactory
    }
}

impl CommandFactory for GridpointsCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> CommandResult<Box<dyn Command>> {
        if args.contains_id("inspect") {
            Ok(Box::new(InspectCommand::new(args)?))
        } else {
            Ok(Box::new(ExtractCommand::new(args)?))
        }
    }
}

/// Command-line interface definition
pub fn build_cli() -> clap::Command {
    use clap::{value_parser, Arg, ArgAction};
    use std::path::PathBuf;

    clap::Command::new("gridpoints")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stream every valid pixel of a category/year GeoTIFF catalog into one CSV")
        .arg(
            Arg::new("root")
                .help("Catalog root laid out as <category>/<year>/<raster>.tif")
                .value_name("ROOT")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("inspect")
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output CSV file [default: points.csv]")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .help("Number of worker threads [default: 4]")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("block-size")
                .long("block-size")
                .help("Window size for stripped rasters [default: 1024]")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("queue-depth")
                .long("queue-depth")
                .help("Files in flight before results are drained [default: 2 x workers]")
                .value_name("Q")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("extensions")
                .long("extensions")
                .help("Comma separated raster extensions [default: tif,tiff]")
                .value_name("LIST"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML file with a [pipeline] table")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Disable the progress display")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More log output (-v info, -vv debug)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write the log to this file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("inspect")
                .long("inspect")
                .help("Print the structure of one raster and exit")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
}
