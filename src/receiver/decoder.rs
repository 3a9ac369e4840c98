//! New Kaku frame decoder state machine.
//!
//! Consumes one completed-pulse duration per edge and walks a frame linearly:
//! sync gap, start bit, 26 address bits, group bit, switch bit, 4 unit bits,
//! 4 optional dim bits, stop bit. Every logical bit is transmitted as four
//! pulses ("bit parts"); each part is a short (1 T) or long (5 T) pulse
//! against the period calibrated from the sync gap.
//!
//! Any duration that fails validation silently resets the machine to the
//! searching state — a malformed frame is dropped whole and decoding restarts
//! at the next sync gap. The transmitter repeats automatically, so the only
//! recovery needed is to keep listening.

use super::frame::{DecodedFrame, SwitchType};
use super::timing::{FrameTiming, PulseClass, SYNC_FLOOR_US};

/// A logical protocol bit, decoded from the four pulse parts composing it.
///
/// The dim marker is a deviation from the bit alphabet (all four parts short)
/// that is only meaningful in the switch-type position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitSymbol {
    Zero,
    One,
    DimMarker,
    Invalid,
}

impl BitSymbol {
    /// Pure classification of one bit-part quadruple, in edge order.
    pub fn from_parts(parts: [PulseClass; 4]) -> Self {
        use PulseClass::{Long, Short};
        match parts {
            [Short, Short, Short, Long] => BitSymbol::Zero,
            [Short, Long, Short, Short] => BitSymbol::One,
            [Short, Short, Short, Short] => BitSymbol::DimMarker,
            _ => BitSymbol::Invalid,
        }
    }
}

/// Frame fields in transmission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Address,
    Group,
    Switch,
    Unit,
    DimLevel,
}

impl Field {
    /// Width in logical bits
    fn width(self) -> u8 {
        match self {
            Field::Address => 26,
            Field::Group => 1,
            Field::Switch => 1,
            Field::Unit => 4,
            Field::DimLevel => 4,
        }
    }
}

/// Position within the field sequence: which field, how many bits of it are
/// still owed, and the pulse classes collected for the bit in progress.
#[derive(Debug, Clone, Copy)]
struct FieldCursor {
    field: Field,
    bits_left: u8,
    parts: [PulseClass; 4],
    part_count: u8,
}

impl FieldCursor {
    fn start(field: Field) -> Self {
        Self {
            field,
            bits_left: field.width(),
            parts: [PulseClass::Short; 4],
            part_count: 0,
        }
    }

    /// Collect one pulse class; returns the quadruple when the 4th part lands.
    fn push(&mut self, class: PulseClass) -> Option<[PulseClass; 4]> {
        self.parts[self.part_count as usize] = class;
        self.part_count += 1;
        if self.part_count == 4 {
            self.part_count = 0;
            Some(self.parts)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Waiting for a sync gap; no calibration is trusted
    Searching,
    /// Verify start-bit high pulse, nominal 1 T
    StartHigh,
    /// Verify start-bit low pulse, nominal 10.44 T
    StartLow,
    /// Decoding field bits, 4 edges per bit
    Bits(FieldCursor),
    /// Verify stop-bit high pulse, nominal 1 T
    StopHigh,
    /// Verify stop-bit low pulse, nominal 40 T
    StopLow,
}

/// The frame under assembly. Cleared when a start bit is verified, so repeat
/// frames never inherit bits from the previous one.
#[derive(Debug, Clone, Copy, Default)]
struct Scratch {
    address: u32,
    unit: u8,
    group_mode: bool,
    switch_type: Option<SwitchType>,
    dim_level: u8,
}

/// Per-edge decoder for a single New Kaku frame.
///
/// Fed the duration of the previous completed pulse on every edge (the noise
/// filter in [`super::Receiver`] owns the edge-to-duration bookkeeping).
/// Returns the decoded frame from the edge that validates the stop gap.
#[derive(Debug)]
pub struct FrameDecoder {
    phase: Phase,
    /// Valid whenever `phase` is not `Searching`; recomputed on every sync.
    /// The initial value is a placeholder and is never consulted while
    /// searching.
    timing: FrameTiming,
    scratch: Scratch,
    /// Fully decoded bits of the frame in progress, for reception polling
    bits_done: u8,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            phase: Phase::Searching,
            timing: FrameTiming::from_sync_gap(SYNC_FLOOR_US),
            scratch: Scratch::default(),
            bits_done: 0,
        }
    }

    /// Drop any frame in progress and wait for a fresh sync gap.
    pub fn resync(&mut self) {
        self.phase = Phase::Searching;
        self.bits_done = 0;
    }

    /// Go straight back to start-bit verification, keeping the current
    /// calibration. Used between repeats of one burst, where the stop gap of
    /// the previous frame doubles as framing and no new sync gap is sent.
    pub fn rearm(&mut self) {
        self.phase = Phase::StartHigh;
        self.bits_done = 0;
    }

    /// False while waiting for a sync gap
    pub fn is_synchronized(&self) -> bool {
        !matches!(self.phase, Phase::Searching)
    }

    /// Shortest pulse the current calibration accepts (0.3 T). Only
    /// meaningful while synchronized.
    pub fn min_pulse(&self) -> u32 {
        self.timing.min_short
    }

    /// Fully decoded bits of the frame in progress
    pub fn bits_done(&self) -> u8 {
        self.bits_done
    }

    /// Process the duration of one completed pulse.
    pub fn feed(&mut self, duration_us: u32) -> Option<DecodedFrame> {
        match self.phase {
            Phase::Searching => {
                // Wait for the long low gap that ends a frame (or idle line).
                // The gap is 40 T; accept transmitters with T down to 120 µs.
                if duration_us > SYNC_FLOOR_US {
                    self.timing = FrameTiming::from_sync_gap(duration_us);
                    self.phase = Phase::StartHigh;
                }
                None
            }
            Phase::StartHigh => {
                if duration_us > self.timing.max_short {
                    self.resync();
                    return None;
                }
                // Start bit verified: this frame starts from a clean slate.
                self.scratch = Scratch::default();
                self.phase = Phase::StartLow;
                None
            }
            Phase::StartLow => {
                if self.timing.start_low_ok(duration_us) {
                    self.phase = Phase::Bits(FieldCursor::start(Field::Address));
                } else {
                    self.resync();
                }
                None
            }
            Phase::Bits(mut cursor) => {
                let class = match self.timing.classify(duration_us) {
                    Some(class) => class,
                    None => {
                        self.resync();
                        return None;
                    }
                };

                match cursor.push(class) {
                    None => self.phase = Phase::Bits(cursor),
                    Some(parts) => {
                        let symbol = BitSymbol::from_parts(parts);
                        if !self.apply_symbol(cursor.field, symbol) {
                            self.resync();
                            return None;
                        }
                        self.bits_done += 1;
                        self.phase = self.after_bit(cursor);
                    }
                }
                None
            }
            Phase::StopHigh => {
                if duration_us < self.timing.min_short || duration_us > self.timing.max_short {
                    self.resync();
                } else {
                    self.phase = Phase::StopLow;
                }
                None
            }
            Phase::StopLow => {
                if !self.timing.stop_low_ok(duration_us) {
                    self.resync();
                    return None;
                }

                let frame = self.take_frame();
                // Default to re-acquiring sync; the caller re-arms instead
                // when it keeps listening for a repeat.
                self.resync();
                frame
            }
        }
    }

    /// Fold one decoded symbol into the scratch frame. False means the symbol
    /// is not valid for this field and the frame must be dropped.
    fn apply_symbol(&mut self, field: Field, symbol: BitSymbol) -> bool {
        match field {
            Field::Address => match symbol {
                BitSymbol::Zero => {
                    self.scratch.address <<= 1;
                    true
                }
                BitSymbol::One => {
                    self.scratch.address = (self.scratch.address << 1) | 1;
                    true
                }
                _ => false,
            },
            Field::Group => match symbol {
                BitSymbol::Zero => {
                    self.scratch.group_mode = false;
                    true
                }
                BitSymbol::One => {
                    self.scratch.group_mode = true;
                    true
                }
                _ => false,
            },
            Field::Switch => match symbol {
                BitSymbol::Zero => {
                    self.scratch.switch_type = Some(SwitchType::Off);
                    true
                }
                BitSymbol::One => {
                    self.scratch.switch_type = Some(SwitchType::On);
                    true
                }
                BitSymbol::DimMarker => {
                    self.scratch.switch_type = Some(SwitchType::Dim);
                    true
                }
                BitSymbol::Invalid => false,
            },
            Field::Unit => match symbol {
                BitSymbol::Zero => {
                    self.scratch.unit <<= 1;
                    true
                }
                BitSymbol::One => {
                    self.scratch.unit = (self.scratch.unit << 1) | 1;
                    true
                }
                _ => false,
            },
            Field::DimLevel => match symbol {
                BitSymbol::Zero => {
                    self.scratch.dim_level <<= 1;
                    true
                }
                BitSymbol::One => {
                    self.scratch.dim_level = (self.scratch.dim_level << 1) | 1;
                    true
                }
                _ => false,
            },
        }
    }

    /// Phase following a completed bit: next bit of the same field, the next
    /// field, or the stop bit. The dim field is only transmitted for dim
    /// commands; for on/off it is absent from the signal and skipped.
    fn after_bit(&self, mut cursor: FieldCursor) -> Phase {
        cursor.bits_left -= 1;
        if cursor.bits_left > 0 {
            return Phase::Bits(cursor);
        }
        match cursor.field {
            Field::Address => Phase::Bits(FieldCursor::start(Field::Group)),
            Field::Group => Phase::Bits(FieldCursor::start(Field::Switch)),
            Field::Switch => Phase::Bits(FieldCursor::start(Field::Unit)),
            Field::Unit => {
                if self.scratch.switch_type == Some(SwitchType::Dim) {
                    Phase::Bits(FieldCursor::start(Field::DimLevel))
                } else {
                    Phase::StopHigh
                }
            }
            Field::DimLevel => Phase::StopHigh,
        }
    }

    /// Assemble the completed frame. The field sequencer guarantees the
    /// switch type was decoded before the stop bit is reached.
    fn take_frame(&self) -> Option<DecodedFrame> {
        let switch_type = self.scratch.switch_type?;
        Some(DecodedFrame {
            period: self.timing.period,
            address: self.scratch.address,
            unit: self.scratch.unit,
            group_mode: self.scratch.group_mode,
            switch_type,
            dim_level: (switch_type == SwitchType::Dim).then_some(self.scratch.dim_level),
        })
    }
}
