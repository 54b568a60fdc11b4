//! Subcommand parsing.
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use wardrobe_core::{GagType, LayerSelection, Padlock};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("missing subcommand")]
    Empty,

    #[error("unknown subcommand `{0}`")]
    Unknown(String),

    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("invalid {what} `{value}`")]
    Invalid { what: &'static str, value: String },
}

/// Which lockable entity a `lock`/`unlock` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockSubject {
    Ensemble,
    Gag(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Enable {
        id: Uuid,
        layers: LayerSelection,
    },
    Disable,
    Gag {
        gag: GagType,
        slot: Option<usize>,
    },
    Ungag {
        slot: usize,
    },
    Lock {
        subject: LockSubject,
        padlock: Padlock,
        password: Option<String>,
        timer: Option<String>,
    },
    Unlock {
        subject: LockSubject,
        password: Option<String>,
    },
    Roll,
    Safeword,
}

pub const USAGE: &str = "\
usage: wardrobe <command>

  status
  enable <ensemble-id> [layer,...]
  disable
  gag <type> [slot]
  ungag <slot>
  lock ensemble <padlock> [password] [timer]
  lock gag <slot> <padlock> [password] [timer]
  unlock ensemble [password]
  unlock gag <slot> [password]
  roll
  safeword";

impl Command {
    /// Parses the arguments following the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let name = args.next().ok_or(CommandError::Empty)?;

        let command = match name.as_str() {
            "status" => Command::Status,
            "enable" => {
                let id = args.next().ok_or(CommandError::MissingArgument {
                    command: "enable",
                    expected: "an ensemble id",
                })?;
                let layers = match args.next() {
                    Some(list) => parse_layers(&list)?,
                    None => LayerSelection::ALL,
                };
                Command::Enable {
                    id: parse("ensemble id", &id)?,
                    layers,
                }
            }
            "disable" => Command::Disable,
            "gag" => {
                let gag = args.next().ok_or(CommandError::MissingArgument {
                    command: "gag",
                    expected: "a gag type",
                })?;
                Command::Gag {
                    gag: parse("gag type", &gag)?,
                    slot: args.next().map(|slot| parse("slot", &slot)).transpose()?,
                }
            }
            "ungag" => {
                let slot = args.next().ok_or(CommandError::MissingArgument {
                    command: "ungag",
                    expected: "a slot",
                })?;
                Command::Ungag {
                    slot: parse("slot", &slot)?,
                }
            }
            "lock" => {
                let subject = parse_subject("lock", &mut args)?;
                let padlock = args.next().ok_or(CommandError::MissingArgument {
                    command: "lock",
                    expected: "a padlock",
                })?;
                let padlock: Padlock = parse("padlock", &padlock)?;

                // A lone extra argument on a timer-only padlock is the timer.
                let first = args.next();
                let second = args.next();
                let timer_only = padlock.requires_timer() && !padlock.requires_password();
                let (password, timer) = match (first, second) {
                    (Some(timer), None) if timer_only => (None, Some(timer)),
                    (first, second) => (first, second),
                };
                Command::Lock {
                    subject,
                    padlock,
                    password,
                    timer,
                }
            }
            "unlock" => Command::Unlock {
                subject: parse_subject("unlock", &mut args)?,
                password: args.next(),
            },
            "roll" => Command::Roll,
            "safeword" => Command::Safeword,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse<T: FromStr>(what: &'static str, value: &str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::Invalid {
        what,
        value: value.to_string(),
    })
}

fn parse_layers(list: &str) -> Result<LayerSelection, CommandError> {
    let indices = list
        .split(',')
        .map(|index| parse::<usize>("layer index", index.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LayerSelection::from_indices(indices))
}

fn parse_subject(
    command: &'static str,
    args: &mut impl Iterator<Item = String>,
) -> Result<LockSubject, CommandError> {
    match args.next().as_deref() {
        Some("ensemble") => Ok(LockSubject::Ensemble),
        Some("gag") => {
            let slot = args.next().ok_or(CommandError::MissingArgument {
                command,
                expected: "a gag slot",
            })?;
            Ok(LockSubject::Gag(parse("slot", &slot)?))
        }
        Some(other) => Err(CommandError::Invalid {
            what: "lock target",
            value: other.to_string(),
        }),
        None => Err(CommandError::MissingArgument {
            command,
            expected: "`ensemble` or `gag <slot>`",
        }),
    }
}
