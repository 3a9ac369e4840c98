//! Recorded pulse traces.
//!
//! A trace is the level+duration sequence a receiver circuit (or an SDR
//! capture) produced for one or more bursts, stored as JSON so signals can be
//! replayed through the decoder on a host. Traces are the only thing this
//! crate ever persists; decoder state itself is never written anywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Failure loading or saving a pulse trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed trace file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("trace contains no pulses")]
    Empty,
}

/// One signal segment: level held for a duration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TracePulse {
    /// Signal level (true = high, false = low)
    pub level: bool,
    /// Duration in microseconds
    pub duration_us: u32,
}

impl TracePulse {
    pub fn new(level: bool, duration_us: u32) -> Self {
        Self { level, duration_us }
    }
}

/// A recorded signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseTrace {
    /// When the signal was captured
    pub timestamp: DateTime<Utc>,
    /// Nominal carrier frequency in Hz
    pub frequency: u32,
    /// Free-form label ("kitchen remote, button 1 on")
    #[serde(default)]
    pub label: Option<String>,
    /// The recorded level+duration sequence
    pub pulses: Vec<TracePulse>,
}

impl PulseTrace {
    /// New trace stamped with the current time.
    pub fn from_pulses(frequency: u32, pulses: Vec<TracePulse>) -> Self {
        Self {
            timestamp: Utc::now(),
            frequency,
            label: None,
            pulses,
        }
    }

    /// Load a trace from a JSON file. An empty pulse list is rejected: it
    /// means the capture went wrong, not that the air was quiet.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let data = std::fs::read_to_string(path)?;
        let trace: PulseTrace = serde_json::from_str(&data)?;
        if trace.pulses.is_empty() {
            return Err(TraceError::Empty);
        }
        Ok(trace)
    }

    /// Save the trace as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), TraceError> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// The edge-timestamp stream this trace produces on the receiver's input
    /// line: one edge at `start_us`, then one per pulse end. Additions wrap,
    /// matching the receiver's clock semantics.
    pub fn edge_timestamps(&self, start_us: u32) -> Vec<u32> {
        let mut t = start_us;
        let mut edges = Vec::with_capacity(self.pulses.len() + 1);
        edges.push(t);
        for pulse in &self.pulses {
            t = t.wrapping_add(pulse.duration_us);
            edges.push(t);
        }
        edges
    }

    /// Number of recorded transitions
    pub fn pulse_count(&self) -> usize {
        self.pulses.len()
    }

    /// The frequency in MHz as a string
    pub fn frequency_mhz(&self) -> String {
        format!("{:.2}MHz", self.frequency as f64 / 1_000_000.0)
    }

    /// Capture time formatted for display
    pub fn timestamp_short(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PulseTrace {
        PulseTrace::from_pulses(
            433_920_000,
            vec![
                TracePulse::new(false, 10400),
                TracePulse::new(true, 260),
                TracePulse::new(false, 2714),
            ],
        )
    }

    #[test]
    fn test_edge_timestamps_are_cumulative() {
        let trace = sample();
        assert_eq!(trace.edge_timestamps(100), vec![100, 10500, 10760, 13474]);
    }

    #[test]
    fn test_edge_timestamps_wrap() {
        let trace = sample();
        let edges = trace.edge_timestamps(u32::MAX - 5000);
        assert_eq!(edges[0], u32::MAX - 5000);
        assert_eq!(edges[1], (u32::MAX - 5000).wrapping_add(10400));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut trace = sample();
        trace.label = Some("test remote".to_string());

        let path = std::env::temp_dir().join("kakurx_trace_test.json");
        trace.save(&path).unwrap();
        let loaded = PulseTrace::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.frequency, trace.frequency);
        assert_eq!(loaded.label.as_deref(), Some("test remote"));
        assert_eq!(loaded.pulse_count(), 3);
        assert_eq!(loaded.pulses[0].duration_us, 10400);
    }

    #[test]
    fn test_empty_trace_is_rejected() {
        let path = std::env::temp_dir().join("kakurx_empty_trace_test.json");
        let empty = PulseTrace::from_pulses(433_920_000, vec![]);
        let data = serde_json::to_string(&empty).unwrap();
        std::fs::write(&path, data).unwrap();

        let result = PulseTrace::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(TraceError::Empty)));
    }

    #[test]
    fn test_display_helpers() {
        let trace = sample();
        assert_eq!(trace.frequency_mhz(), "433.92MHz");
    }
}
