use log::error;
use std::path::PathBuf;
use std::process;

use gridpoints::commands::{build_cli, CommandFactory, GridpointsCommandFactory};
use gridpoints::utils::logger::Logger;

fn main() {
    let matches = build_cli().get_matches();

    let level = Logger::level_for_verbosity(matches.get_count("verbose"));
    let log_file = matches.get_one::<PathBuf>("log-file");
    if let Err(e) = Logger::init_global_logger(log_file.map(PathBuf::as_path), level) {
        eprintln!("Error setting up logger: {}", e);
        process::exit(1);
    }

    let factory = GridpointsCommandFactory::new();

    let command_result = factory.create_command(&matches);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            process::exit(1);
        }
    };
}
