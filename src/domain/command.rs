use crate::domain::{TimestampError, parse_timestamp};
use std::num::IntErrorKind;
use thiserror::Error;

pub const COMMAND_MARKER: char = '!';

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OffsetTarget {
    Index(usize),
    All,
    Last,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Help,
    End,
    Start { initial_offset: i64 },
    Pause,
    Resume,
    Offset { target: OffsetTarget, delta: i64 },
    Edit { index: Option<usize>, text: String },
    Delete { index: usize },
    Tag(String),
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandParseError {
    #[error("Unknown command: {0}. Use !help for a list of valid commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error("Invalid offset: {0}. Use +/-<seconds>.")]
    InvalidDelta(String),

    #[error("Offset too large: {0}")]
    DeltaOverflow(String),
}

const USAGE_START: &str = "!start [HH:MM:SS]";
const USAGE_OFFSET: &str = "!offset <n>/all +/-<seconds>";
const USAGE_PREVIOUS: &str = "!previous +/-<seconds>";
const USAGE_EDIT: &str = "!e [n] <new text>";
const USAGE_DELETE: &str = "!delete <n>";

/// Parses one trimmed input line. Returns `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with(COMMAND_MARKER) {
        return Ok(Some(Command::Tag(line.to_string())));
    }

    let (word, rest) = split_word(line);
    let args = rest.split_whitespace().collect::<Vec<_>>();

    let command = match word {
        "!help" => bare(&args, Command::Help, "!help")?,
        "!end" => bare(&args, Command::End, "!end")?,
        "!pause" => bare(&args, Command::Pause, "!pause")?,
        "!resume" => bare(&args, Command::Resume, "!resume")?,
        "!start" => match args.as_slice() {
            [] => Command::Start { initial_offset: 0 },
            [timestamp] => Command::Start {
                initial_offset: parse_timestamp(timestamp)?,
            },
            _ => return Err(CommandParseError::Usage(USAGE_START)),
        },
        "!offset" => match args.as_slice() {
            [delta] => Command::Offset {
                target: OffsetTarget::Last,
                delta: parse_delta(delta)?,
            },
            ["all", delta] => Command::Offset {
                target: OffsetTarget::All,
                delta: parse_delta(delta)?,
            },
            [index, delta] => Command::Offset {
                target: OffsetTarget::Index(
                    parse_index(index).ok_or(CommandParseError::Usage(USAGE_OFFSET))?,
                ),
                delta: parse_delta(delta)?,
            },
            _ => return Err(CommandParseError::Usage(USAGE_OFFSET)),
        },
        "!p" | "!previous" => match args.as_slice() {
            [delta] => Command::Offset {
                target: OffsetTarget::Last,
                delta: parse_delta(delta)?,
            },
            _ => return Err(CommandParseError::Usage(USAGE_PREVIOUS)),
        },
        "!e" | "!edit" => parse_edit(rest)?,
        "!delete" => match args.as_slice() {
            [index] => Command::Delete {
                index: parse_index(index).ok_or(CommandParseError::Usage(USAGE_DELETE))?,
            },
            _ => return Err(CommandParseError::Usage(USAGE_DELETE)),
        },
        _ => return Err(CommandParseError::Unknown(line.to_string())),
    };

    Ok(Some(command))
}

fn split_word(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    }
}

fn bare(args: &[&str], command: Command, usage: &'static str) -> Result<Command, CommandParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandParseError::Usage(usage))
    }
}

fn parse_edit(rest: &str) -> Result<Command, CommandParseError> {
    let (first, remainder) = split_word(rest);
    let (index, text) = match parse_index(first) {
        Some(index) => (Some(index), remainder),
        None => (None, rest),
    };
    if text.is_empty() {
        return Err(CommandParseError::Usage(USAGE_EDIT));
    }
    Ok(Command::Edit {
        index,
        text: text.to_string(),
    })
}

/// A run of digits; values too large to address any tag saturate so the
/// store reports them as an invalid index.
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(token.parse().unwrap_or(usize::MAX))
}

fn parse_delta(token: &str) -> Result<i64, CommandParseError> {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(CommandParseError::InvalidDelta(token.to_string()));
    }
    token.parse::<i64>().map_err(|error| match error.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            CommandParseError::DeltaOverflow(token.to_string())
        }
        _ => CommandParseError::InvalidDelta(token.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parse_command(line).expect("parse").expect("command")
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn free_text_becomes_tag() {
        assert_eq!(parse("hello world"), Command::Tag("hello world".to_string()));
    }

    #[test]
    fn start_accepts_optional_offset() {
        assert_eq!(parse("!start"), Command::Start { initial_offset: 0 });
        assert_eq!(
            parse("!start 01:00:05"),
            Command::Start {
                initial_offset: 3605
            }
        );
        assert!(matches!(
            parse_command("!start 00:61:00"),
            Err(CommandParseError::Timestamp(TimestampError::Invalid(_)))
        ));
        assert_eq!(
            parse_command("!start 1 2"),
            Err(CommandParseError::Usage(USAGE_START))
        );
    }

    #[test]
    fn offset_target_selection() {
        assert_eq!(
            parse("!offset 3 +10"),
            Command::Offset {
                target: OffsetTarget::Index(3),
                delta: 10
            }
        );
        assert_eq!(
            parse("!offset all -100"),
            Command::Offset {
                target: OffsetTarget::All,
                delta: -100
            }
        );
        assert_eq!(
            parse("!offset -4"),
            Command::Offset {
                target: OffsetTarget::Last,
                delta: -4
            }
        );
        assert_eq!(
            parse("!p 7"),
            Command::Offset {
                target: OffsetTarget::Last,
                delta: 7
            }
        );
        assert_eq!(
            parse("!previous -2"),
            Command::Offset {
                target: OffsetTarget::Last,
                delta: -2
            }
        );
    }

    #[test]
    fn offset_rejects_malformed_arguments() {
        assert_eq!(
            parse_command("!offset x +1"),
            Err(CommandParseError::Usage(USAGE_OFFSET))
        );
        assert_eq!(
            parse_command("!p abc"),
            Err(CommandParseError::InvalidDelta("abc".to_string()))
        );
        assert_eq!(
            parse_command("!p"),
            Err(CommandParseError::Usage(USAGE_PREVIOUS))
        );
        assert!(matches!(
            parse_command("!offset 1 +99999999999999999999"),
            Err(CommandParseError::DeltaOverflow(_))
        ));
    }

    #[test]
    fn edit_with_and_without_index() {
        assert_eq!(
            parse("!e 2 new $"),
            Command::Edit {
                index: Some(2),
                text: "new $".to_string()
            }
        );
        assert_eq!(
            parse("!e fixed  spacing kept"),
            Command::Edit {
                index: None,
                text: "fixed  spacing kept".to_string()
            }
        );
        assert_eq!(
            parse("!edit 1 x"),
            Command::Edit {
                index: Some(1),
                text: "x".to_string()
            }
        );
        assert_eq!(
            parse("!e 2abc"),
            Command::Edit {
                index: None,
                text: "2abc".to_string()
            }
        );
        assert_eq!(parse_command("!e 4"), Err(CommandParseError::Usage(USAGE_EDIT)));
        assert_eq!(parse_command("!e"), Err(CommandParseError::Usage(USAGE_EDIT)));
    }

    #[test]
    fn delete_requires_index() {
        assert_eq!(parse("!delete 3"), Command::Delete { index: 3 });
        assert_eq!(
            parse_command("!delete"),
            Err(CommandParseError::Usage(USAGE_DELETE))
        );
        assert_eq!(
            parse_command("!delete one"),
            Err(CommandParseError::Usage(USAGE_DELETE))
        );
    }

    #[test]
    fn unknown_marker_commands_are_reported() {
        assert_eq!(
            parse_command("!frobnicate now"),
            Err(CommandParseError::Unknown("!frobnicate now".to_string()))
        );
        assert_eq!(
            parse_command("!end now"),
            Err(CommandParseError::Usage("!end"))
        );
    }
}
