//! Validation and decoding of status query replies.
//!
//! The device answers a query with the report ID echoed in front of a
//! 6-byte payload:
//!
//! ```text
//! [0x10, marker, 0x81, subcode, d0, d1, d2]
//! ```
//!
//! `marker` is 0x00, 0x01 or 0x02. Different families answer the same query
//! with different subcodes, so each query kind accepts a small set of them.

use crate::codec::{CLASS_GET, FRAME_LEN};
use crate::command::WheelMode;
use crate::error::{hex_bytes, Error, Result};
use serde::Serialize;
use tracing::{trace, warn};

/// Status markers accepted in the first payload byte.
const ACCEPTED_MARKERS: &[u8] = &[0x00, 0x01, 0x02];

/// Status query kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Mode,
    Battery,
}

/// Subcodes accepted in a reply, per query kind.
///
/// 0x08 appears in both sets as observed on real devices.
const ACCEPTED_SUBCODES: &[(QueryKind, &[u8])] = &[
    (QueryKind::Mode, &[0xB1, 0x08]),
    (QueryKind::Battery, &[0x0D, 0x08]),
];

impl QueryKind {
    /// Subcode sent in the query frame.
    pub fn subcode(&self) -> u8 {
        match self {
            Self::Mode => 0x08,
            Self::Battery => 0x0D,
        }
    }

    pub fn accepted_subcodes(&self) -> &'static [u8] {
        ACCEPTED_SUBCODES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, codes)| *codes)
            .unwrap_or(&[])
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::Battery => "battery",
        }
    }
}

/// Reply payload with the echoed report ID removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    pub marker: u8,
    pub class: u8,
    pub subcode: u8,
    pub data: [u8; 3],
}

impl ResponseFrame {
    pub fn from_payload(payload: [u8; FRAME_LEN]) -> Self {
        let [marker, class, subcode, d0, d1, d2] = payload;
        Self {
            marker,
            class,
            subcode,
            data: [d0, d1, d2],
        }
    }

    /// Strip the echoed report ID from a raw read.
    pub fn from_raw(kind: QueryKind, raw: &[u8]) -> Result<Self> {
        let payload: [u8; FRAME_LEN] = raw
            .get(1..=FRAME_LEN)
            .and_then(|p| p.try_into().ok())
            .ok_or_else(|| Error::MalformedResponse {
                kind: kind.name(),
                raw: hex_bytes(raw),
            })?;
        Ok(Self::from_payload(payload))
    }

    pub fn to_payload(&self) -> [u8; FRAME_LEN] {
        let [d0, d1, d2] = self.data;
        [self.marker, self.class, self.subcode, d0, d1, d2]
    }

    /// Whether this reply has an accepted shape for `kind`.
    pub fn is_valid_for(&self, kind: QueryKind) -> bool {
        ACCEPTED_MARKERS.contains(&self.marker)
            && self.class == CLASS_GET
            && kind.accepted_subcodes().contains(&self.subcode)
    }
}

/// Battery charge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryState {
    OnBattery,
    Charging,
    FullyCharged,
    Unknown(u8),
}

impl BatteryState {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x30 => Self::OnBattery,
            0x50 => Self::Charging,
            0x90 => Self::FullyCharged,
            other => Self::Unknown(other),
        }
    }
}

impl std::fmt::Display for BatteryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnBattery => write!(f, "running on battery"),
            Self::Charging => write!(f, "charging"),
            Self::FullyCharged => write!(f, "fully charged"),
            Self::Unknown(code) => write!(f, "status {code:02x}"),
        }
    }
}

/// Battery level and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryStatus {
    /// Charge in percent, as reported.
    pub percent: u8,
    pub state: BatteryState,
}

impl std::fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "battery level {}%, {}", self.percent, self.state)
    }
}

/// Decoded reply to a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    Mode { mode: WheelMode },
    Battery(BatteryStatus),
}

impl QueryResult {
    fn extract(kind: QueryKind, frame: &ResponseFrame) -> Self {
        let [d0, _, d2] = frame.data;
        match kind {
            QueryKind::Mode => {
                let mode = if d2 & 0x01 != 0 {
                    WheelMode::ClickToClick
                } else {
                    WheelMode::FreeSpin
                };
                Self::Mode { mode }
            }
            QueryKind::Battery => Self::Battery(BatteryStatus {
                percent: d0,
                state: BatteryState::from_code(d2),
            }),
        }
    }
}

impl std::fmt::Display for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mode { mode } => write!(f, "{mode}"),
            Self::Battery(status) => write!(f, "{status}"),
        }
    }
}

/// Validate an echo-stripped reply and decode it.
pub fn extract(kind: QueryKind, frame: &ResponseFrame) -> Result<QueryResult> {
    if !frame.is_valid_for(kind) {
        let raw = hex_bytes(&frame.to_payload());
        warn!(kind = kind.name(), raw = %raw, "Rejected query reply");
        return Err(Error::MalformedResponse {
            kind: kind.name(),
            raw,
        });
    }
    let result = QueryResult::extract(kind, frame);
    trace!(kind = kind.name(), ?result, "Decoded query reply");
    Ok(result)
}

/// Strip the echoed report ID from `raw`, validate the shape for `kind`, and decode it.
pub fn validate_and_extract(kind: QueryKind, raw: &[u8]) -> Result<QueryResult> {
    let frame = ResponseFrame::from_raw(kind, raw)?;
    extract(kind, &frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echoed(payload: [u8; 6]) -> Vec<u8> {
        let mut raw = vec![0x10];
        raw.extend_from_slice(&payload);
        raw
    }

    #[test]
    fn mode_reply_click_by_click() {
        let raw = echoed([0x01, 0x81, 0x08, 0x00, 0x00, 0x01]);
        let result = validate_and_extract(QueryKind::Mode, &raw).unwrap();
        assert_eq!(
            result,
            QueryResult::Mode {
                mode: WheelMode::ClickToClick
            }
        );
        assert_eq!(result.to_string(), "click-by-click");
    }

    #[test]
    fn mode_reply_free_spinning_uses_bit_zero_only() {
        let raw = echoed([0x02, 0x81, 0xB1, 0x00, 0x00, 0xFE]);
        let result = validate_and_extract(QueryKind::Mode, &raw).unwrap();
        assert_eq!(result.to_string(), "free spinning");
    }

    #[test]
    fn battery_reply_on_battery() {
        let raw = echoed([0x02, 0x81, 0x0D, 0x50, 0x00, 0x30]);
        let result = validate_and_extract(QueryKind::Battery, &raw).unwrap();
        assert_eq!(
            result,
            QueryResult::Battery(BatteryStatus {
                percent: 80,
                state: BatteryState::OnBattery
            })
        );
        assert_eq!(result.to_string(), "battery level 80%, running on battery");
    }

    #[test]
    fn battery_states() {
        assert_eq!(BatteryState::from_code(0x50), BatteryState::Charging);
        assert_eq!(BatteryState::from_code(0x90), BatteryState::FullyCharged);
        assert_eq!(BatteryState::from_code(0x7A).to_string(), "status 7a");
    }

    #[test]
    fn battery_accepts_shared_subcode() {
        let raw = echoed([0x00, 0x81, 0x08, 0x64, 0x00, 0x90]);
        assert!(validate_and_extract(QueryKind::Battery, &raw).is_ok());
    }

    #[test]
    fn subcode_sets_are_per_kind() {
        let mode_only = echoed([0x01, 0x81, 0xB1, 0x00, 0x00, 0x00]);
        assert!(validate_and_extract(QueryKind::Battery, &mode_only).is_err());

        let battery_only = echoed([0x01, 0x81, 0x0D, 0x00, 0x00, 0x00]);
        assert!(validate_and_extract(QueryKind::Mode, &battery_only).is_err());
    }

    #[test]
    fn rejects_wrong_class_byte() {
        for kind in [QueryKind::Mode, QueryKind::Battery] {
            let raw = echoed([0x01, 0x80, 0x08, 0x00, 0x00, 0x01]);
            assert!(matches!(
                validate_and_extract(kind, &raw),
                Err(Error::MalformedResponse { .. })
            ));
        }
    }

    #[test]
    fn rejects_unknown_marker() {
        let raw = echoed([0x03, 0x81, 0x08, 0x00, 0x00, 0x01]);
        assert!(validate_and_extract(QueryKind::Mode, &raw).is_err());
    }

    #[test]
    fn rejection_reports_hex_frame() {
        let raw = echoed([0x01, 0x8F, 0x08, 0x00, 0x00, 0x01]);
        match validate_and_extract(QueryKind::Mode, &raw).unwrap_err() {
            Error::MalformedResponse { kind, raw } => {
                assert_eq!(kind, "mode");
                assert_eq!(raw, "01 8F 08 00 00 01");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_short_read() {
        let raw = [0x10, 0x01, 0x81, 0x08];
        assert!(matches!(
            validate_and_extract(QueryKind::Mode, &raw),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn ignores_bytes_past_frame() {
        let mut raw = echoed([0x01, 0x81, 0x08, 0x00, 0x00, 0x01]);
        raw.extend_from_slice(&[0xAA; 13]);
        assert!(validate_and_extract(QueryKind::Mode, &raw).is_ok());
    }

    #[test]
    fn query_result_serializes_with_kind_tag() {
        let result = QueryResult::Battery(BatteryStatus {
            percent: 42,
            state: BatteryState::Charging,
        });
        let json = serde_json::to_value(result).expect("serialize result");
        assert_eq!(json["kind"], "battery");
        assert_eq!(json["percent"], 42);
        assert_eq!(json["state"], "charging");
    }
}
