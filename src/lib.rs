//! kakurx — receiver for the New Kaku (KlikAanKlikUit) remote-control
//! protocol.
//!
//! Decodes the 433.92 MHz self-learning socket protocol from a stream of
//! pulse-edge timestamps: feed [`Receiver::handle_edge`] from a GPIO edge
//! interrupt (or replay a recorded [`PulseTrace`]) and receive validated,
//! repeat-debounced [`DecodedFrame`] commands through a callback.
//!
//! The protocol self-calibrates: every burst starts with a long low gap of
//! 40 time units, from which the decoder derives the transmitter's period
//! and all pulse tolerances. A frame carries a 26-bit address, a group flag,
//! an on/off/dim command, a 4-bit unit index and, for dim commands only, a
//! 4-bit dim level.

pub mod capture;
pub mod config;
pub mod receiver;

pub use capture::{PulseTrace, TraceError, TracePulse};
pub use config::Config;
pub use receiver::{DecodedFrame, Receiver, ReceiverHandle, SwitchType};
