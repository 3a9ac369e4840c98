//! Decoded frame data structures.

use serde::{Deserialize, Serialize};

/// Command kind carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchType {
    Off,
    On,
    /// Set a 16-step dim level; the level travels in the frame's dim field
    Dim,
}

impl std::fmt::Display for SwitchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchType::Off => write!(f, "Off"),
            SwitchType::On => write!(f, "On"),
            SwitchType::Dim => write!(f, "Dim"),
        }
    }
}

/// One complete, validated transmission.
///
/// `period` is the time unit calibrated from the sync gap of the frame's own
/// burst and varies with the transmitter; it is not part of the command
/// identity (see [`DecodedFrame::same_command`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedFrame {
    /// Calibrated duration of one protocol time unit, in µs
    pub period: u32,
    /// 26-bit sender/device address
    pub address: u32,
    /// 4-bit sub-device index
    pub unit: u8,
    /// Whether the command applies to the whole group
    pub group_mode: bool,
    /// Command kind
    pub switch_type: SwitchType,
    /// Dim level (0-15). Present only for `SwitchType::Dim` frames.
    pub dim_level: Option<u8>,
}

impl DecodedFrame {
    /// Field-wise equality for repeat counting. Compares everything the
    /// transmitter encodes; `period` is a receiver-side measurement and is
    /// deliberately excluded.
    pub fn same_command(&self, other: &DecodedFrame) -> bool {
        self.address == other.address
            && self.unit == other.unit
            && self.dim_level == other.dim_level
            && self.group_mode == other.group_mode
            && self.switch_type == other.switch_type
    }

    /// Address as a zero-padded hex string
    pub fn address_hex(&self) -> String {
        format!("{:07X}", self.address)
    }

    /// Target description: the unit index, or "group" for group commands
    pub fn target(&self) -> String {
        if self.group_mode {
            "group".to_string()
        } else {
            format!("unit {}", self.unit)
        }
    }
}

impl std::fmt::Display for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.dim_level {
            Some(level) => write!(
                f,
                "{} {} addr {} {} (T={}µs)",
                self.switch_type,
                level,
                self.address_hex(),
                self.target(),
                self.period
            ),
            None => write!(
                f,
                "{} addr {} {} (T={}µs)",
                self.switch_type,
                self.address_hex(),
                self.target(),
                self.period
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(period: u32) -> DecodedFrame {
        DecodedFrame {
            period,
            address: 0x0ABCDEF,
            unit: 5,
            group_mode: false,
            switch_type: SwitchType::On,
            dim_level: None,
        }
    }

    #[test]
    fn test_same_command_ignores_period() {
        let a = frame(260);
        let b = frame(274);
        assert!(a.same_command(&b));
    }

    #[test]
    fn test_same_command_detects_field_change() {
        let a = frame(260);
        let mut b = frame(260);
        b.unit = 6;
        assert!(!a.same_command(&b));

        let mut c = frame(260);
        c.switch_type = SwitchType::Dim;
        c.dim_level = Some(9);
        assert!(!a.same_command(&c));
    }

    #[test]
    fn test_display_formats() {
        let mut a = frame(260);
        assert_eq!(format!("{}", a), "On addr 0ABCDEF unit 5 (T=260µs)");
        a.switch_type = SwitchType::Dim;
        a.dim_level = Some(9);
        a.group_mode = true;
        assert_eq!(format!("{}", a), "Dim 9 addr 0ABCDEF group (T=260µs)");
    }
}
