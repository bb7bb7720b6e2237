use crate::domain::MAX_ENTRIES;
use crate::infra::{
    DEFAULT_OUTPUT_FILE, TranscriptPaths, default_output_file, default_scratch_file,
};
use std::path::PathBuf;
use thiserror::Error;

const MAX_PATH_BYTES: usize = 255;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Run(RunConfig),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunConfig {
    pub paths: TranscriptPaths,
    /// Transcript loaded as the starting store. `-f` moves the destination
    /// without changing this.
    pub resume_from: Option<PathBuf>,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CliParseError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("{flag} path too long (max {max} bytes)", max = MAX_PATH_BYTES)]
    PathTooLong { flag: String },
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut destination = default_output_file();
    let mut scratch = default_scratch_file();
    let mut destination_set = false;
    let mut resume_from = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let flag = arg.as_str();
        match flag {
            "-f" | "-t" | "--resume" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue(flag.to_string()))?;
                let path = parse_path_flag(flag, value)?;
                match flag {
                    "-t" => scratch = path,
                    "--resume" => {
                        if !destination_set {
                            destination = path.clone();
                        }
                        resume_from = Some(path);
                    }
                    _ => {
                        destination = path;
                        destination_set = true;
                    }
                }
            }
            _ => return Err(CliParseError::UnknownArgument(arg.to_string())),
        }
    }

    Ok(CliInvocation::Run(RunConfig {
        paths: TranscriptPaths {
            destination,
            scratch,
        },
        resume_from,
    }))
}

fn parse_path_flag(flag: &str, value: &str) -> Result<PathBuf, CliParseError> {
    if value.len() > MAX_PATH_BYTES {
        return Err(CliParseError::PathTooLong {
            flag: flag.to_string(),
        });
    }
    Ok(PathBuf::from(value))
}

pub fn help_text() -> String {
    format!(
        "\n--- {name} v{version} ---
Commands:
  !start [HH:MM:SS]                Start a tagging session, optionally setting an initial timestamp offset.
  !end                             End the tagging session and save to the output file.
  !offset <n>/all +/-<seconds>     Adjust the timestamp of tag(s) <n>/all by +/- seconds.
  !offset +/-<seconds>             Adjust the timestamp of the last tag.
  !previous +/-<seconds>           Adjust the timestamp of the last tag by +/- seconds.
  !p +/-<seconds>                  Same as !previous.
  !e [n] <new text>                Change the text of tag <n>; without <n> it edits the last tag.
                                   '$' stands for the previous text of the tag ('\\$' for a literal '$').
  !pause                           Pause the timer.
  !resume                          Resume the timer.
  !delete <n>                      Delete tag <n>.
  !help                            Show this help message.
  <any text>                       Add a new tag with the current timestamp and the input text.

Command-line arguments:
  -f <output_file>                 Output file (default: {output}).
  -t <temp_file>                   Temporary file (default: {scratch}).
  --resume <file>                  Resume tagging from an existing file.

Use up/down arrow keys to cycle through command history.
Maximum {max} tags allowed.
Set EEPYTAGGER_LOG=debug for diagnostic logging on stderr.
------------------------
",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        output = DEFAULT_OUTPUT_FILE,
        scratch = default_scratch_file().display(),
        max = MAX_ENTRIES,
    )
}
