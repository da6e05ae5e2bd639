//! Device channel abstraction.
//!
//! Provides a trait over the raw HID node so that real devices and mock
//! devices share the same interface. Writes are fire-and-forget: the
//! firmware never acknowledges them, so nothing here retries.

use crate::codec::OutboundReport;
use crate::error::{hex_bytes, Error, Result};
use tracing::trace;

/// Abstraction over a blocking HID read/write handle.
pub trait DeviceChannel {
    /// Write one report (report ID first). Returns the number of bytes written.
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Block until one report arrives. Returns the number of bytes read.
    fn read(&self, buf: &mut [u8]) -> Result<usize>;
}

/// Write one outbound report.
pub fn send_report(channel: &dyn DeviceChannel, report: &OutboundReport) -> Result<()> {
    let wire = report.to_wire();
    trace!(
        report_id = format_args!("0x{:02X}", report.report_id),
        report_hex = %hex_bytes(&wire),
        "TX"
    );

    let written = channel.write(&wire)?;
    if written != wire.len() {
        return Err(Error::ChannelIo(format!(
            "short write: {written} of {} bytes",
            wire.len()
        )));
    }
    Ok(())
}

/// Read one report of `len` payload bytes plus the echoed report ID.
pub fn read_report(channel: &dyn DeviceChannel, report_id: u8, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len + 1];
    let n = channel.read(&mut buf)?;
    buf.truncate(n);
    trace!(
        report_id = format_args!("0x{:02X}", report_id),
        report_hex = %hex_bytes(&buf),
        "RX"
    );
    Ok(buf)
}


#[cfg(test)]
mod tests {
    use super::*;
    use mock::MockChannel;

    struct ShortWriter;

    impl DeviceChannel for ShortWriter {
        fn write(&self, data: &[u8]) -> Result<usize> {
            Ok(data.len() - 1)
        }

        fn read(&self, _buf: &mut [u8]) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn send_report_prepends_report_id() {
        let mock = MockChannel::new();
        let report = OutboundReport {
            report_id: 0x10,
            payload: vec![1, 2, 3, 4, 5, 6],
        };
        send_report(&mock, &report).unwrap();
        assert_eq!(mock.written(), vec![vec![0x10, 1, 2, 3, 4, 5, 6]]);
    }

    #[test]
    fn send_report_detects_short_write() {
        let report = OutboundReport {
            report_id: 0x10,
            payload: vec![0; 6],
        };
        assert!(matches!(
            send_report(&ShortWriter, &report),
            Err(Error::ChannelIo(_))
        ));
    }

    #[test]
    fn send_report_surfaces_write_failure() {
        let mock = MockChannel::new();
        mock.fail_writes(true);
        let report = OutboundReport::frame([0; 6]);
        assert!(send_report(&mock, &report).is_err());
        assert!(mock.written().is_empty());
    }

    #[test]
    fn read_report_reads_len_plus_echo() {
        let mock = MockChannel::new();
        mock.push_reply(vec![0x10, 1, 0x81, 8, 0, 0, 1, 0xEE]);
        let raw = read_report(&mock, 0x10, 6).unwrap();
        assert_eq!(raw, vec![0x10, 1, 0x81, 8, 0, 0, 1]);
    }

    #[test]
    fn read_report_truncates_to_bytes_read() {
        let mock = MockChannel::new();
        mock.push_reply(vec![0x10, 1]);
        assert_eq!(read_report(&mock, 0x10, 6).unwrap(), vec![0x10, 1]);
    }
}
