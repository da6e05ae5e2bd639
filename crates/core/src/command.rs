//! Command vocabulary and token decoding.
//!
//! Each command-line token decodes into exactly one [`Command`]. Decoding
//! validates every argument, so an invocation either decodes completely or
//! fails before any report reaches the device.

use crate::args;
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::debug;

/// Highest button number that fits the protocol nibble.
pub const BUTTON_MAX: u8 = 15;
/// Highest auto-switch speed accepted by the firmware.
pub const SPEED_MAX: u8 = 50;
/// Default report for `query` without arguments.
pub const DEFAULT_QUERY_REPORT: u8 = 0x10;
/// Default length for `query` without arguments.
pub const DEFAULT_QUERY_LEN: u8 = 6;
/// Maximum number of values in a `raw` token (report id plus payload).
pub const RAW_MAX_VALUES: usize = 256;

/// Whether a mode change survives a power cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Persistence {
    /// Becomes the power-up default.
    Persistent,
    /// Lasts until the next change.
    Temporary,
}

impl Persistence {
    /// Bit ORed into the mode opcode.
    pub fn bit(&self) -> u8 {
        match self {
            Self::Persistent => 0x80,
            Self::Temporary => 0x00,
        }
    }
}

/// Wheel mode selected by `free` / `click`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelMode {
    FreeSpin,
    ClickToClick,
}

impl std::fmt::Display for WheelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FreeSpin => write!(f, "free spinning"),
            Self::ClickToClick => write!(f, "click-by-click"),
        }
    }
}

/// Which soft threshold a `soft-*` command tunes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftKind {
    Free,
    Click,
}

/// One decoded command token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetMode(WheelMode, Persistence),
    /// Free-spin with `up`, click-to-click with `down`; a toggle when equal.
    SetManualButtons {
        up: u8,
        down: u8,
        persistence: Persistence,
    },
    /// Speeds in roughly clicks per second, 0 keeps the configured speed.
    SetAutoSpeed {
        up: u8,
        down: u8,
        persistence: Persistence,
    },
    SetSoftThreshold(SoftKind, u8, u8),
    Reconnect,
    QueryMode,
    QueryBattery,
    /// Debug: write `payload` under `report_id` verbatim.
    RawReport { report_id: u8, payload: Vec<u8> },
    /// Debug: read `length` bytes of `report_id` without writing first.
    RawQuery { report_id: u8, length: u8 },
    Sleep(u8),
}

impl Command {
    /// Decode a single command token such as `temp-manual=4,5`.
    pub fn parse(token: &str) -> Result<Self> {
        let command = decode(token)?;
        debug!(token, ?command, "Decoded command");
        Ok(command)
    }

    /// Whether this command skips semantic validation and writes operator bytes.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::RawReport { .. } | Self::RawQuery { .. })
    }
}

/// Decode every token, stopping at the first failure.
pub fn parse_commands<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Command>> {
    tokens.iter().map(|t| Command::parse(t.as_ref())).collect()
}

fn decode(token: &str) -> Result<Command> {
    let (persistence, name) = match token.strip_prefix("temp-") {
        Some(rest) => (Persistence::Temporary, rest),
        None => (Persistence::Persistent, token),
    };

    let unknown = || Error::UnknownCommand(token.to_string());

    match name {
        "free" => return Ok(Command::SetMode(WheelMode::FreeSpin, persistence)),
        "click" => return Ok(Command::SetMode(WheelMode::ClickToClick, persistence)),
        _ => {}
    }

    if let Some(rest) = name.strip_prefix("manual") {
        let (up, down) = args::parse_pair(rest, 0, 0, BUTTON_MAX)?;
        return Ok(Command::SetManualButtons {
            up,
            down,
            persistence,
        });
    }

    if let Some(rest) = name.strip_prefix("auto") {
        let (up, down) = args::parse_pair(rest, 0, 0, SPEED_MAX)?;
        return Ok(Command::SetAutoSpeed {
            up,
            down,
            persistence,
        });
    }

    // The remaining commands have no temporary variant.
    if persistence == Persistence::Temporary {
        return Err(unknown());
    }

    match name {
        "reconnect" => return Ok(Command::Reconnect),
        "mode" => return Ok(Command::QueryMode),
        "battery" => return Ok(Command::QueryBattery),
        _ => {}
    }

    if let Some(rest) = name.strip_prefix("soft-free") {
        let (a, b) = args::parse_pair(rest, 0, 0, u8::MAX)?;
        return Ok(Command::SetSoftThreshold(SoftKind::Free, a, b));
    }

    if let Some(rest) = name.strip_prefix("soft-click") {
        let (a, b) = args::parse_pair(rest, 0, 0, u8::MAX)?;
        return Ok(Command::SetSoftThreshold(SoftKind::Click, a, b));
    }

    if let Some(rest) = name.strip_prefix("raw") {
        let (values, supplied) = args::parse_n(rest, RAW_MAX_VALUES, 0, 0, u8::MAX)?;
        if supplied == 0 {
            return Err(Error::MalformedArgument {
                token: token.to_string(),
                reason: "report id expected".to_string(),
            });
        }
        return Ok(Command::RawReport {
            report_id: values[0],
            payload: values[1..supplied].to_vec(),
        });
    }

    if let Some(rest) = name.strip_prefix("query") {
        let (report_id, length) = if rest.is_empty() {
            (DEFAULT_QUERY_REPORT, DEFAULT_QUERY_LEN)
        } else {
            let (report_id, rest) = args::parse_one(rest, '=', DEFAULT_QUERY_REPORT, 0, u8::MAX)?;
            let (length, rest) = args::parse_one(rest, ',', DEFAULT_QUERY_LEN, 0, u8::MAX)?;
            if !rest.is_empty() {
                return Err(Error::MalformedArgument {
                    token: token.to_string(),
                    reason: format!("unexpected `{rest}'"),
                });
            }
            (report_id, length)
        };
        return Ok(Command::RawQuery { report_id, length });
    }

    if let Some(rest) = name.strip_prefix("sleep") {
        let (seconds, _) = args::parse_pair(rest, 1, 0, u8::MAX)?;
        return Ok(Command::Sleep(seconds));
    }

    Err(unknown())
}

/// Documented button numbers for `manual`.
const BUTTON_NAMES: &[(u8, &str)] = &[
    (0, "previously set button"),
    (1, "left button"),
    (2, "right button"),
    (3, "middle (wheel) button"),
    (4, "rear thumb button"),
    (5, "front thumb button"),
    (6, "find button"),
    (7, "wheel left tilt"),
    (8, "wheel right tilt"),
    (9, "thumb wheel forward"),
    (11, "thumb wheel backward"),
    (13, "thumb wheel pressed"),
];

/// Human-readable name of a button number, if the number is documented.
pub fn button_name(button: u8) -> Option<&'static str> {
    BUTTON_NAMES
        .iter()
        .find(|(n, _)| *n == button)
        .map(|(_, name)| *name)
}

/// Left and right cannot switch the wheel mode.
pub fn is_mode_switch_button(button: u8) -> bool {
    !matches!(button, 1 | 2)
}
