//! Test-only synthesis of protocol-valid pulse trains.
//!
//! Builds the duration and edge-timestamp sequences a transmitter would
//! produce, for exercising the decoder and receiver. Timings follow the
//! protocol framing: start pulse 1 T high / 10.44 T low, four pulse parts per
//! bit (1 T or 5 T), stop pulse 1 T high / 40 T low.

use super::frame::SwitchType;
use super::timing::GAP_UNITS;

/// The four pulse-part durations of one logical bit
pub fn bit_parts(bit: bool, period: u32) -> [u32; 4] {
    let short = period;
    let long = 5 * period;
    if bit {
        [short, long, short, short]
    } else {
        [short, short, short, long]
    }
}

/// The dim marker: four short parts
pub fn dim_marker_parts(period: u32) -> [u32; 4] {
    [period; 4]
}

/// Inter-frame low gap (40 T), also usable as the leading sync gap
pub fn sync_gap(period: u32) -> u32 {
    GAP_UNITS * period
}

/// All pulse durations of one frame: start bit, fields, stop bit. The dim
/// field is only emitted for dim commands, as on air.
pub fn frame_durations(
    address: u32,
    unit: u8,
    group: bool,
    switch: SwitchType,
    dim_level: u8,
    period: u32,
) -> Vec<u32> {
    let mut d = Vec::with_capacity(150);

    d.push(period); // start high
    d.push(period * 1044 / 100); // start low, 10.44 T

    for i in (0..26).rev() {
        d.extend(bit_parts((address >> i) & 1 == 1, period));
    }
    d.extend(bit_parts(group, period));
    match switch {
        SwitchType::Off => d.extend(bit_parts(false, period)),
        SwitchType::On => d.extend(bit_parts(true, period)),
        SwitchType::Dim => d.extend(dim_marker_parts(period)),
    }
    for i in (0..4).rev() {
        d.extend(bit_parts((unit >> i) & 1 == 1, period));
    }
    if switch == SwitchType::Dim {
        for i in (0..4).rev() {
            d.extend(bit_parts((dim_level >> i) & 1 == 1, period));
        }
    }

    d.push(period); // stop high
    d.push(sync_gap(period)); // stop low
    d
}

/// A burst: leading sync gap plus `repeats` identical frames
pub fn burst(
    address: u32,
    unit: u8,
    group: bool,
    switch: SwitchType,
    dim_level: u8,
    period: u32,
    repeats: usize,
) -> Vec<u32> {
    let mut d = vec![sync_gap(period)];
    for _ in 0..repeats {
        d.extend(frame_durations(address, unit, group, switch, dim_level, period));
    }
    d
}

/// Edge timestamps for a duration sequence: one edge at `start_us`, then one
/// per pulse end. Wrapping addition, as the receiver's clock wraps.
pub fn edges(start_us: u32, durations: &[u32]) -> Vec<u32> {
    let mut t = start_us;
    let mut out = Vec::with_capacity(durations.len() + 1);
    out.push(t);
    for &d in durations {
        t = t.wrapping_add(d);
        out.push(t);
    }
    out
}
