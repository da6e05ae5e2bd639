//! mx-wheel-core: scroll wheel command decoding, report codec, and device discovery.
//!
//! This crate drives the undocumented wheel-control reports of Logitech's
//! MX-Revolution mice (and the MX-5500 keyboard/mouse combo) over raw HID.
//! Command tokens are decoded into [`command::Command`] values, encoded into
//! 6-byte report 0x10 frames by [`codec::Encoder`], and query replies are
//! validated by [`response::validate_and_extract`].

pub mod args;
pub mod channel;
pub mod codec;
pub mod command;
pub mod device;
pub mod error;
pub mod response;
pub mod session;

/// Logitech USB Vendor ID.
pub const LOGITECH_VID: u16 = 0x046D;

/// Known product IDs handled by this crate.
pub mod pids {
    /// MX-Revolution, firmware RR41.01_B0025.
    pub const MX_REVOLUTION: u16 = 0xC51A;
    /// MX-Revolution, firmware RQR02.00_B0020.
    pub const MX_REVOLUTION_2: u16 = 0xC525;
    /// MX-Revolution, unidentified firmware revision.
    pub const MX_REVOLUTION_3: u16 = 0xC526;
    /// MX-Revolution behind a Unifying receiver.
    pub const MX_REVOLUTION_4: u16 = 0xC52B;
    /// MX-Revolution, R0019.
    pub const MX_REVOLUTION_5: u16 = 0xB007;
    /// MX-5500 keyboard/mouse combo.
    pub const MX_5500: u16 = 0xC71C;
}
