//! Main application entry point.
//!
//! Parses the command line and dispatches: help and version exit early,
//! everything else hands over to the `Mobihue` coordinator.

use anyhow::Result;

use mobihue::args::{self, CliAction, ParsedArgs};
use mobihue::constants::EXIT_FAILURE;
use mobihue::Mobihue;

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => Mobihue::new(debug_enabled)
            .with_config_dir(config_dir.map(Into::into))
            .run(),
    }
}
