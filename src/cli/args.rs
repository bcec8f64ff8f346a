//! Command-line argument parsing for the `chatwatch` binary.
//!
//! This module turns the raw argument list into a [`CliCommand`].

/// Options for a gateway session run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Log at debug level unless `RUST_LOG` says otherwise
    pub verbose: bool,
    /// Credential; falls back to `CHATWATCH_TOKEN`
    pub token: Option<String>,
    /// User id to look up once connected
    pub profile: Option<String>,
    /// Read JSON lines from stdin and ingest each one
    pub ingest_stdin: bool,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Connect to the gateway (default)
    Run(RunOptions),
}

/// Usage text for `--help`.
pub const USAGE: &str = "\
Usage: chatwatch [OPTIONS]

Options:
  -t, --token <TOKEN>   ChatWatch token (default: $CHATWATCH_TOKEN)
  -p, --profile <USER>  Print the moderation profile of USER once connected
  -i, --ingest          Ingest JSON lines from stdin:
                        {\"content\",\"user\",\"message\",\"channel\",\"guild\"}
  -v, --verbose         Debug logging
  -V, --version         Print version
  -h, --help            Print this help";

/// Parse command-line arguments and return the appropriate command.
///
/// The first item is the program name and is skipped.
///
/// # Errors
///
/// Returns a message for unknown flags and for flags missing their value.
///
/// # Examples
///
/// ```
/// use chatwatch::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["chatwatch".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, String>
where
    I: Iterator<Item = String>,
{
    let mut options = RunOptions::default();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => {
                (flag.to_string(), Some(value.to_string()))
            }
            _ => (arg.clone(), None),
        };

        match flag.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--verbose" | "-v" => options.verbose = true,
            "--ingest" | "-i" => options.ingest_stdin = true,
            "--token" | "-t" => {
                options.token = Some(take_value(&flag, inline, &mut args)?);
            }
            "--profile" | "-p" => {
                options.profile = Some(take_value(&flag, inline, &mut args)?);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(CliCommand::Run(options))
}

fn take_value<I>(flag: &str, inline: Option<String>, args: &mut I) -> Result<String, String>
where
    I: Iterator<Item = String>,
{
    inline
        .or_else(|| args.next())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("{} requires a value", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, String> {
        let mut all = vec!["chatwatch".to_string()];
        all.extend(args.iter().map(|a| a.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["-h"]), Ok(CliCommand::Help));
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), Ok(CliCommand::Run(RunOptions::default())));
    }

    #[test]
    fn test_parse_run_options() {
        let command = parse(&["-v", "--token", "abc", "--profile=42", "-i"]).unwrap();
        assert_eq!(
            command,
            CliCommand::Run(RunOptions {
                verbose: true,
                token: Some("abc".to_string()),
                profile: Some("42".to_string()),
                ingest_stdin: true,
            })
        );
    }

    #[test]
    fn test_parse_missing_value() {
        assert_eq!(
            parse(&["--token"]),
            Err("--token requires a value".to_string())
        );
        assert!(parse(&["--profile="]).is_err());
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(
            parse(&["--unknown"]),
            Err("Unknown argument: --unknown".to_string())
        );
    }
}
