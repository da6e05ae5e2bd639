//! Device model: family detection and HID discovery.

use crate::error::{Error, Result};
use crate::{pids, LOGITECH_VID};
use serde::Serialize;
use tracing::{debug, info};

/// Product family; selects the first byte of every command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceFamily {
    /// MX-Revolution mice and receivers.
    Revolution,
    /// MX-5500 keyboard/mouse combo.
    Combo,
}

impl DeviceFamily {
    /// Product IDs of the Revolution family.
    pub const REVOLUTION_PIDS: &'static [u16] = &[
        pids::MX_REVOLUTION,
        pids::MX_REVOLUTION_2,
        pids::MX_REVOLUTION_3,
        pids::MX_REVOLUTION_4,
        pids::MX_REVOLUTION_5,
    ];

    /// Product IDs of the combo family.
    pub const COMBO_PIDS: &'static [u16] = &[pids::MX_5500];

    /// Look up the family from USB vendor and product ID.
    pub fn from_ids(vendor_id: u16, product_id: u16) -> Option<Self> {
        if vendor_id != LOGITECH_VID {
            return None;
        }
        if Self::REVOLUTION_PIDS.contains(&product_id) {
            Some(Self::Revolution)
        } else if Self::COMBO_PIDS.contains(&product_id) {
            Some(Self::Combo)
        } else {
            None
        }
    }

    /// Frame discriminant byte.
    pub fn discriminant(&self) -> u8 {
        match self {
            Self::Revolution => 1,
            Self::Combo => 2,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Revolution => "Logitech MX-Revolution",
            Self::Combo => "Logitech MX-5500",
        }
    }
}

/// Information about a discovered device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub family: DeviceFamily,
    pub vid: u16,
    pub pid: u16,
    pub path: String,
}

/// Every supported `vendor:product` pair, for diagnostics.
pub fn supported_ids() -> String {
    DeviceFamily::REVOLUTION_PIDS
        .iter()
        .chain(DeviceFamily::COMBO_PIDS)
        .map(|pid| format!("{LOGITECH_VID:04x}:{pid:04x}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Map a hidapi error onto the core error type.
pub fn map_hid_error(context: &str, err: &hidapi::HidError) -> Error {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("permission") || lower.contains("access denied") {
        Error::PermissionDenied(format!(
            "{context}: {msg} (try running as root or install a udev rule for hidraw)"
        ))
    } else {
        Error::ChannelIo(format!("{context}: {msg}"))
    }
}

/// Map a hidapi error raised while writing or reading an open device.
///
/// Always a per-command channel error, even when the OS reports a permission problem.
pub fn map_channel_error(context: &str, err: &hidapi::HidError) -> Error {
    Error::ChannelIo(format!("{context}: {err}"))
}

/// Enumerate HID devices and return every supported one.
pub fn discover_devices(api: &hidapi::HidApi) -> Vec<DeviceInfo> {
    debug!("Starting HID device enumeration");

    let devices: Vec<DeviceInfo> = api
        .device_list()
        .filter_map(|info| {
            let family = DeviceFamily::from_ids(info.vendor_id(), info.product_id())?;
            info!(
                family = family.name(),
                vid = format_args!("0x{:04X}", info.vendor_id()),
                pid = format_args!("0x{:04X}", info.product_id()),
                path = %info.path().to_string_lossy(),
                discriminant = family.discriminant(),
                "Found device"
            );
            Some(DeviceInfo {
                family,
                vid: info.vendor_id(),
                pid: info.product_id(),
                path: info.path().to_string_lossy().into_owned(),
            })
        })
        .collect();

    debug!(count = devices.len(), "Device enumeration complete");
    devices
}

/// Pick the device to talk to: the one at `path` if given and supported, otherwise the first found.
pub fn select_device(devices: &[DeviceInfo], path: Option<&str>) -> Result<DeviceInfo> {
    if let Some(path) = path {
        if let Some(dev) = devices.iter().find(|d| d.path == path) {
            return Ok(dev.clone());
        }
        debug!(path, "Requested path is not a supported device, falling back");
    }

    devices.first().cloned().ok_or_else(|| {
        Error::DeviceNotFound(format!("no supported device ({}) found", supported_ids()))
    })
}
