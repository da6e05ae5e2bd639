//! Invocation driver: runs decoded commands against one device channel.
//!
//! Commands execute strictly in order. Decode errors abort the whole
//! invocation before any I/O; errors while talking to the device are
//! recorded per command and the next command still runs.

use crate::channel::{read_report, send_report, DeviceChannel};
use crate::codec::{persistence_of, Encoder, FRAME_LEN, REPORT_ID};
use crate::command::{parse_commands, Command};
use crate::device::DeviceFamily;
use crate::error::{Error, Result};
use crate::response::{validate_and_extract, QueryKind, QueryResult};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Steps the user must follow after a reconnect frame was sent.
pub const RECONNECT_INSTRUCTIONS: &[&str] = &[
    "Reconnection initiated",
    " - Turn off the mouse",
    " - Press and hold the left mouse button",
    " - Turn on the mouse",
    " - Press the right button 5 times",
    " - Release the left mouse button",
];

/// Classification of errors for abort decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad command token; nothing may be sent.
    Decode,
    /// Device reply had an unexpected shape; the result is unknown.
    Response,
    /// Write or read failed.
    Channel,
    /// Device missing or inaccessible.
    Device,
}

impl ErrorClass {
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::MalformedArgument { .. }
            | Error::ArgumentOutOfRange { .. }
            | Error::UnknownCommand(_) => Self::Decode,
            Error::MalformedResponse { .. } => Self::Response,
            Error::ChannelIo(_) => Self::Channel,
            Error::DeviceNotFound(_) | Error::PermissionDenied(_) => Self::Device,
        }
    }

    /// Whether this error stops the remaining commands.
    pub fn aborts_invocation(&self) -> bool {
        matches!(self, Self::Decode | Self::Device)
    }
}

/// What a successfully executed command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Report written; the device does not acknowledge.
    Sent,
    /// Pairing frame written; show [`RECONNECT_INSTRUCTIONS`].
    Reconnecting,
    Status(QueryResult),
    /// Bytes returned by a raw `query`.
    RawReport { report_id: u8, data: Vec<u8> },
    Slept(u8),
}

/// One executed command and its result.
#[derive(Debug)]
pub struct Step {
    pub command: Command,
    pub result: Result<Outcome>,
}

/// A connected device ready to take commands.
pub struct Session<'a> {
    channel: &'a dyn DeviceChannel,
    encoder: Encoder,
}

impl<'a> Session<'a> {
    pub fn new(channel: &'a dyn DeviceChannel, family: DeviceFamily) -> Self {
        debug!(
            family = family.name(),
            discriminant = family.discriminant(),
            "Session opened"
        );
        Self {
            channel,
            encoder: Encoder::new(family),
        }
    }

    /// Execute one command: its writes, then its read if it is a query.
    pub fn execute(&self, command: &Command) -> Result<Outcome> {
        if command.is_raw() {
            debug!(?command, "Raw command bypasses validation");
        }
        if let Some(frame) = self.encoder.wheel_frame(command) {
            debug!(
                opcode = format_args!("0x{:02X}", frame.opcode),
                persistence = ?persistence_of(frame.opcode),
                "Wheel write"
            );
        }

        for report in self.encoder.encode(command) {
            send_report(self.channel, &report)?;
        }

        match command {
            Command::QueryMode => self.status(QueryKind::Mode),
            Command::QueryBattery => self.status(QueryKind::Battery),
            Command::Reconnect => {
                info!("Reconnect frame sent");
                Ok(Outcome::Reconnecting)
            }
            Command::RawQuery { report_id, length } => {
                let data = read_report(self.channel, *report_id, *length as usize)?;
                Ok(Outcome::RawReport {
                    report_id: *report_id,
                    data,
                })
            }
            Command::Sleep(seconds) => {
                std::thread::sleep(Duration::from_secs(*seconds as u64));
                Ok(Outcome::Slept(*seconds))
            }
            _ => Ok(Outcome::Sent),
        }
    }

    fn status(&self, kind: QueryKind) -> Result<Outcome> {
        let raw = read_report(self.channel, REPORT_ID, FRAME_LEN)?;
        validate_and_extract(kind, &raw).map(Outcome::Status)
    }

    /// Execute every command in order, continuing past per-command failures.
    pub fn run(&self, commands: Vec<Command>) -> Vec<Step> {
        let mut steps = Vec::with_capacity(commands.len());
        self.run_with(commands, |step| steps.push(step));
        steps
    }

    /// Like [`Session::run`], handing each step to `on_step` as soon as its command finishes.
    pub fn run_with(&self, commands: Vec<Command>, mut on_step: impl FnMut(Step)) {
        for command in commands {
            let result = self.execute(&command);
            let abort = match &result {
                Err(e) => {
                    let class = ErrorClass::classify(e);
                    warn!(?command, ?class, "Command failed: {e}");
                    class.aborts_invocation()
                }
                Ok(_) => false,
            };
            on_step(Step { command, result });
            if abort {
                break;
            }
        }
    }
}

/// Decode every token, then run them all. A decode error returns before any I/O.
pub fn run_tokens<S: AsRef<str>>(
    channel: &dyn DeviceChannel,
    family: DeviceFamily,
    tokens: &[S],
) -> Result<Vec<Step>> {
    let commands = parse_commands(tokens)?;
    Ok(Session::new(channel, family).run(commands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::MockChannel;
    use crate::command::WheelMode;

    #[test]
    fn classify_decode_errors() {
        let err = Error::ArgumentOutOfRange {
            text: "16".into(),
            min: 0,
            max: 15,
        };
        assert_eq!(ErrorClass::classify(&err), ErrorClass::Decode);
        assert!(ErrorClass::classify(&err).aborts_invocation());
        assert_eq!(
            ErrorClass::classify(&Error::UnknownCommand("x".into())),
            ErrorClass::Decode
        );
    }

    #[test]
    fn classify_recoverable_errors() {
        let bad = Error::MalformedResponse {
            kind: "mode",
            raw: "00".into(),
        };
        assert_eq!(ErrorClass::classify(&bad), ErrorClass::Response);
        assert!(!ErrorClass::classify(&bad).aborts_invocation());

        let io = Error::ChannelIo("write: broken pipe".into());
        assert_eq!(ErrorClass::classify(&io), ErrorClass::Channel);
        assert!(!ErrorClass::classify(&io).aborts_invocation());
    }

    #[test]
    fn classify_device_errors() {
        let err = Error::PermissionDenied("/dev/hidraw0".into());
        assert_eq!(ErrorClass::classify(&err), ErrorClass::Device);
        assert!(ErrorClass::classify(&err).aborts_invocation());
    }

    #[test]
    fn execute_write_returns_sent() {
        let mock = MockChannel::new();
        let session = Session::new(&mock, DeviceFamily::Revolution);
        let outcome = session
            .execute(&Command::SetMode(
                WheelMode::FreeSpin,
                crate::command::Persistence::Persistent,
            ))
            .unwrap();
        assert_eq!(outcome, Outcome::Sent);
        assert_eq!(mock.written().len(), 1);
    }

    #[test]
    fn execute_raw_query_reads_without_writing() {
        let mock = MockChannel::new();
        mock.push_reply(vec![0x11, 0xAA, 0xBB]);
        let session = Session::new(&mock, DeviceFamily::Revolution);
        let outcome = session
            .execute(&Command::RawQuery {
                report_id: 0x11,
                length: 2,
            })
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::RawReport {
                report_id: 0x11,
                data: vec![0x11, 0xAA, 0xBB]
            }
        );
        assert!(mock.written().is_empty());
    }

    #[test]
    fn execute_sleep_zero() {
        let mock = MockChannel::new();
        let session = Session::new(&mock, DeviceFamily::Revolution);
        assert_eq!(
            session.execute(&Command::Sleep(0)).unwrap(),
            Outcome::Slept(0)
        );
        assert!(mock.written().is_empty());
    }

    #[test]
    fn run_with_reports_each_step_before_the_next_runs() {
        let mock = MockChannel::new();
        mock.push_reply(vec![0x10, 0x01, 0x81, 0x0D, 0x50, 0x00, 0x30]);
        let session = Session::new(&mock, DeviceFamily::Revolution);
        let commands = parse_commands(&["battery", "reconnect", "mode"]).unwrap();

        let mut seen = Vec::new();
        session.run_with(commands, |step| {
            // Writes issued so far when this step is reported.
            seen.push((mock.written().len(), step.result.map_err(|e| e.to_string())));
        });

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, 1);
        assert!(matches!(
            seen[0].1,
            Ok(Outcome::Status(QueryResult::Battery(_)))
        ));
        assert_eq!(seen[1], (2, Ok(Outcome::Reconnecting)));
        // No reply queued for the mode query: the read fails, after its write.
        assert_eq!(seen[2].0, 3);
        assert!(seen[2].1.is_err());
    }

    #[test]
    fn channel_error_does_not_abort_run() {
        let mock = MockChannel::new();
        let session = Session::new(&mock, DeviceFamily::Revolution);
        let commands = parse_commands(&["mode", "free"]).unwrap();
        let steps = session.run(commands);
        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[0].result, Err(Error::ChannelIo(_))));
        assert!(matches!(steps[1].result, Ok(Outcome::Sent)));
    }

    #[test]
    fn reconnect_instructions_start_with_notice() {
        assert_eq!(RECONNECT_INSTRUCTIONS[0], "Reconnection initiated");
        assert_eq!(RECONNECT_INSTRUCTIONS.len(), 6);
    }
}
