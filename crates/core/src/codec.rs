//! Report encoding for the wheel-control channel.
//!
//! Every command travels as a 6-byte payload under report ID 0x10:
//!
//! ```text
//! set:   [family, 0x80, 0x56, opcode, p1, p2]
//! get:   [family, 0x81, subcode, 0x00, 0x00, 0x00]
//! ```
//!
//! `family` is the device family discriminant (1 or 2). Mode opcodes carry a
//! persistence bit (0x80) that makes the change the power-up default.

use crate::command::{
    button_name, is_mode_switch_button, Command, Persistence, SoftKind, WheelMode,
};
use crate::device::DeviceFamily;
use crate::response::QueryKind;
use tracing::{debug, warn};

/// Report ID of the command channel.
pub const REPORT_ID: u8 = 0x10;
/// Payload length of a command channel report (report ID excluded).
pub const FRAME_LEN: usize = 6;

/// Class byte of a write to a device register.
pub const CLASS_SET: u8 = 0x80;
/// Class byte of a register read, echoed back in replies.
pub const CLASS_GET: u8 = 0x81;
/// Register holding the wheel configuration.
pub const WHEEL_REGISTER: u8 = 0x56;

/// Literal frame that puts the receiver into pairing mode.
pub const RECONNECT_FRAME: [u8; FRAME_LEN] = [0xFF, 0x80, 0xB2, 0x01, 0x00, 0x00];

/// Wheel register opcodes (low bits, before the persistence bit).
pub mod opcodes {
    pub const FREE_SPIN: u8 = 0x01;
    pub const CLICK_TO_CLICK: u8 = 0x02;
    pub const SOFT_FREE: u8 = 0x03;
    pub const SOFT_CLICK: u8 = 0x04;
    pub const AUTO_SWITCH: u8 = 0x05;
    pub const BUTTON_PAIR: u8 = 0x07;
    pub const BUTTON_TOGGLE: u8 = 0x08;
}

/// A write to the wheel register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub discriminant: u8,
    /// Opcode including the persistence bit where it applies.
    pub opcode: u8,
    pub params: [u8; 2],
}

impl CommandFrame {
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let [p1, p2] = self.params;
        [
            self.discriminant,
            CLASS_SET,
            WHEEL_REGISTER,
            self.opcode,
            p1,
            p2,
        ]
    }

    /// Parse a wheel register write back out of its payload.
    pub fn from_bytes(bytes: &[u8; FRAME_LEN]) -> Option<Self> {
        let [discriminant, class, register, opcode, p1, p2] = *bytes;
        if class != CLASS_SET || register != WHEEL_REGISTER {
            return None;
        }
        Some(Self {
            discriminant,
            opcode,
            params: [p1, p2],
        })
    }

    /// Opcode with the persistence bit removed.
    pub fn base_opcode(&self) -> u8 {
        self.opcode & !0x80
    }

    pub fn is_persistent(&self) -> bool {
        self.opcode & 0x80 != 0
    }
}

/// A status read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFrame {
    pub discriminant: u8,
    pub subcode: u8,
}

impl QueryFrame {
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        [self.discriminant, CLASS_GET, self.subcode, 0x00, 0x00, 0x00]
    }
}

/// One outbound write: a report ID followed by its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReport {
    pub report_id: u8,
    pub payload: Vec<u8>,
}

impl OutboundReport {
    /// A command channel report.
    pub fn frame(frame: [u8; FRAME_LEN]) -> Self {
        Self {
            report_id: REPORT_ID,
            payload: frame.to_vec(),
        }
    }

    /// Bytes as written to the device node: `payload.len() + 1` bytes.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.payload.len() + 1);
        buf.push(self.report_id);
        buf.extend_from_slice(&self.payload);
        buf
    }
}

/// Turns commands into reports for one connected device.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    discriminant: u8,
}

impl Encoder {
    pub fn new(family: DeviceFamily) -> Self {
        Self {
            discriminant: family.discriminant(),
        }
    }

    fn wheel(&self, opcode: u8, p1: u8, p2: u8) -> CommandFrame {
        CommandFrame {
            discriminant: self.discriminant,
            opcode,
            params: [p1, p2],
        }
    }

    /// Frame for a validated wheel command, or `None` for commands that are not wheel writes.
    pub fn wheel_frame(&self, command: &Command) -> Option<CommandFrame> {
        let frame = match *command {
            Command::SetMode(mode, persistence) => {
                let base = match mode {
                    WheelMode::FreeSpin => opcodes::FREE_SPIN,
                    WheelMode::ClickToClick => opcodes::CLICK_TO_CLICK,
                };
                self.wheel(base | persistence.bit(), 0, 0)
            }
            Command::SetManualButtons {
                up,
                down,
                persistence,
            } => {
                debug!(
                    up,
                    up_name = button_name(up).unwrap_or("undocumented"),
                    down,
                    down_name = button_name(down).unwrap_or("undocumented"),
                    "Manual mode buttons"
                );
                for button in [up, down] {
                    if !is_mode_switch_button(button) {
                        warn!(
                            button,
                            name = button_name(button).unwrap_or("undocumented"),
                            "Button cannot switch the wheel mode"
                        );
                    }
                }
                if up != down {
                    self.wheel(opcodes::BUTTON_PAIR | persistence.bit(), (up << 4) | down, 0)
                } else {
                    self.wheel(opcodes::BUTTON_TOGGLE | persistence.bit(), up, 0)
                }
            }
            Command::SetAutoSpeed {
                up,
                down,
                persistence,
            } => self.wheel(opcodes::AUTO_SWITCH | persistence.bit(), up, down),
            Command::SetSoftThreshold(kind, a, b) => {
                let opcode = match kind {
                    SoftKind::Free => opcodes::SOFT_FREE,
                    SoftKind::Click => opcodes::SOFT_CLICK,
                };
                self.wheel(opcode, a, b)
            }
            _ => return None,
        };
        Some(frame)
    }

    /// Query frame for a status read.
    pub fn query_frame(&self, kind: QueryKind) -> QueryFrame {
        QueryFrame {
            discriminant: self.discriminant,
            subcode: kind.subcode(),
        }
    }

    /// Reports to write for `command`, in order. Reads are not represented here.
    pub fn encode(&self, command: &Command) -> Vec<OutboundReport> {
        if let Some(frame) = self.wheel_frame(command) {
            return vec![OutboundReport::frame(frame.to_bytes())];
        }

        match command {
            Command::Reconnect => vec![OutboundReport::frame(RECONNECT_FRAME)],
            Command::QueryMode => {
                vec![OutboundReport::frame(self.query_frame(QueryKind::Mode).to_bytes())]
            }
            Command::QueryBattery => {
                vec![OutboundReport::frame(self.query_frame(QueryKind::Battery).to_bytes())]
            }
            Command::RawReport { report_id, payload } => vec![OutboundReport {
                report_id: *report_id,
                payload: payload.clone(),
            }],
            _ => Vec::new(),
        }
    }
}

/// Persistence encoded in an opcode byte.
pub fn persistence_of(opcode: u8) -> Persistence {
    if opcode & 0x80 != 0 {
        Persistence::Persistent
    } else {
        Persistence::Temporary
    }
}
