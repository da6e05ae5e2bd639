//! Error types for mx-wheel-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad punctuation or trailing garbage in a command argument.
    #[error("bad argument `{token}': {reason}")]
    MalformedArgument { token: String, reason: String },

    /// Numeric argument outside the range allowed for its slot.
    #[error("argument `{text}' out of range ({min}-{max})")]
    ArgumentOutOfRange { text: String, min: u32, max: u32 },

    /// Token does not name a known command.
    #[error("unknown command `{0}'")]
    UnknownCommand(String),

    /// Device reply did not match any accepted shape for the query.
    #[error("bad answer to {kind} query: {raw}")]
    MalformedResponse { kind: &'static str, raw: String },

    /// Write or read against the device channel failed.
    #[error("HID I/O error: {0}")]
    ChannelIo(String),

    /// No supported device was found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The OS refused access to the HID node.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Format bytes as space-separated upper-case hex, the way rejected frames are reported.
pub fn hex_bytes(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
