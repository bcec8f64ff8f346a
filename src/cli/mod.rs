//! CLI module for the `chatwatch` binary.
//!
//! Handles argument parsing and the flags that exit before a gateway
//! connection is made.
//!
//! ```ignore
//! use chatwatch::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! if let Some(options) = run_cli_command(command) {
//!     // connect with `options`
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, CliCommand, RunOptions, USAGE};
pub use version::{handle_version_command, VERSION};

/// Run a CLI command if applicable.
///
/// Returns the run options when the gateway should be started.
///
/// # Note
///
/// `Version` and `Help` never return; both exit the process.
pub fn run_cli_command(command: CliCommand) -> Option<RunOptions> {
    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => {
            println!("{}", USAGE);
            std::process::exit(0)
        }
        CliCommand::Run(options) => Some(options),
    }
}
