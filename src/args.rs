//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. It supports the standard help,
//! version and debug flags while gracefully handling unknown options.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the normal application with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse the process arguments into a structured result.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    /// Parse command-line arguments into a structured result.
    ///
    /// Help and version flags take precedence over everything else; any
    /// unknown argument turns the run into a help display with a failure
    /// exit code.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut config_dir: Option<String> = None;
        let mut unknown_arg_found = false;

        let mut idx = 0;
        while idx < args_vec.len() {
            match args_vec[idx].as_str() {
                "--version" | "-V" | "-v" => {
                    return ParsedArgs {
                        action: CliAction::ShowVersion,
                    };
                }
                "--help" | "-h" => {
                    return ParsedArgs {
                        action: CliAction::ShowHelp,
                    };
                }
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => {
                    match args_vec.get(idx + 1) {
                        Some(dir) => {
                            config_dir = Some(dir.clone());
                            idx += 1;
                        }
                        None => unknown_arg_found = true,
                    };
                }
                _ => unknown_arg_found = true,
            }
            idx += 1;
        }

        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        ParsedArgs {
            action: CliAction::Run {
                debug_enabled,
                config_dir,
            },
        }
    }
}

/// Display version information using the logging system.
pub fn display_version_info() {
    log_version!();
    println!("┃ ");
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Display help information using the logging system.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("mobihue [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_a_plain_run() {
        let parsed = ParsedArgs::parse(["mobihue"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn debug_and_config_flags_combine() {
        let parsed = ParsedArgs::parse(["mobihue", "-d", "--config", "/tmp/mh"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/mh".into()),
            }
        );
    }

    #[test]
    fn help_takes_precedence_over_other_flags() {
        let parsed = ParsedArgs::parse(["mobihue", "-d", "--help"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn version_flag_is_recognized() {
        let parsed = ParsedArgs::parse(["mobihue", "-V"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn unknown_arguments_fall_back_to_help() {
        let parsed = ParsedArgs::parse(["mobihue", "--bogus"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn config_flag_without_a_value_is_an_error() {
        let parsed = ParsedArgs::parse(["mobihue", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
