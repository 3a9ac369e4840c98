//! New Kaku (KlikAanKlikUit) receiver subsystem.
//!
//! The entry point is [`Receiver::handle_edge`], called once per
//! rising-or-falling transition of the receiver data line with a microsecond
//! timestamp. Edges pass a glitch filter, feed the frame decoder, and
//! completed frames go through repeat aggregation before the consumer
//! callback fires.
//!
//! Ownership and sharing follow the single-writer model: all decoding state
//! is owned by the [`Receiver`] and mutated only from the edge context. The
//! enabled flag and a reception-progress counter are the only values shared
//! with other contexts, as relaxed atomics behind [`ReceiverHandle`]. There
//! is deliberately no lock: a handle racing an edge takes effect on the next
//! edge, never mid-decode.

mod decoder;
mod frame;
mod timing;

#[cfg(test)]
mod testsig;

pub use frame::{DecodedFrame, SwitchType};

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use decoder::FrameDecoder;

/// Reception-in-progress threshold: start pulse verified plus eight decoded
/// bits means a frame is very likely on the air.
const RECEIVING_THRESHOLD_BITS: u8 = 8;

/// Consumer callback, invoked synchronously from the edge context. Must be
/// short and non-blocking, and must not re-enter the receiver.
pub type FrameCallback = Box<dyn FnMut(DecodedFrame) + Send>;

/// State shared between the edge context and control-surface callers.
struct Shared {
    enabled: AtomicBool,
    /// Decoded-bit count of the frame in progress, written by the edge
    /// context, read by [`ReceiverHandle::is_receiving`]
    progress: AtomicU8,
}

/// Cloneable control surface for a [`Receiver`], usable from any thread.
///
/// Enable/disable are single atomic-flag writes; they take effect on the
/// next edge rather than instantaneously.
#[derive(Clone)]
pub struct ReceiverHandle {
    shared: Arc<Shared>,
}

impl ReceiverHandle {
    /// Let edges reach the decoder again.
    pub fn enable(&self) {
        self.shared.enabled.store(true, Ordering::Relaxed);
    }

    /// Ignore all subsequent edges. A frame in flight is abandoned.
    pub fn disable(&self) {
        self.shared.enabled.store(false, Ordering::Relaxed);
    }

    /// Busy-wait up to `timeout` for a reception in progress.
    ///
    /// Returns true as soon as the decoder has verified a start pulse and
    /// eight bits of the current frame, false once the timeout elapses.
    pub fn is_receiving(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.shared.progress.load(Ordering::Relaxed) >= RECEIVING_THRESHOLD_BITS {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            std::thread::yield_now();
        }
    }
}

/// Edge-driven receiver for the New Kaku remote protocol.
///
/// Created enabled. Dispatches a [`DecodedFrame`] to the callback once the
/// same command has been decoded `min_repeats` times in a row.
pub struct Receiver {
    decoder: FrameDecoder,
    callback: FrameCallback,
    /// Consecutive identical frames required before dispatch
    min_repeats: u16,
    /// Baseline for repeat comparison: the last validated frame
    previous: Option<DecodedFrame>,
    /// Consecutive frames matching `previous`
    repeats: u16,
    /// Timestamps of the last three edges. A pulse's duration is only known
    /// at its trailing edge, and the glitch filter needs one more edge of
    /// lookahead, so decoding runs one pulse behind the line.
    edge_ts: [u32; 3],
    /// Glitch filter: drop the next edge without measuring it
    skip_next: bool,
    /// Dispatch re-entrancy guard
    in_callback: bool,
    shared: Arc<Shared>,
}

impl Receiver {
    pub fn new(min_repeats: u16, callback: impl FnMut(DecodedFrame) + Send + 'static) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            callback: Box::new(callback),
            min_repeats,
            previous: None,
            repeats: 0,
            edge_ts: [0; 3],
            skip_next: false,
            in_callback: false,
            shared: Arc::new(Shared {
                enabled: AtomicBool::new(true),
                progress: AtomicU8::new(0),
            }),
        }
    }

    /// Control surface shared with other threads.
    pub fn handle(&self) -> ReceiverHandle {
        ReceiverHandle {
            shared: self.shared.clone(),
        }
    }

    /// Start listening from a clean searching state.
    pub fn enable(&mut self) {
        self.decoder.resync();
        self.skip_next = false;
        self.publish_progress();
        self.shared.enabled.store(true, Ordering::Relaxed);
    }

    /// Stop decoding; subsequent edges are ignored.
    pub fn disable(&mut self) {
        self.shared.enabled.store(false, Ordering::Relaxed);
    }

    /// The edge-event entry point: call once per transition of the input
    /// line, with the transition's timestamp in µs from any monotonic,
    /// wrapping source. Completes in bounded time and never blocks.
    pub fn handle_edge(&mut self, now_us: u32) {
        if !self.shared.enabled.load(Ordering::Relaxed) {
            // Abandon any partial frame so re-enabling starts clean.
            if self.decoder.is_synchronized() {
                self.decoder.resync();
                self.publish_progress();
            }
            self.skip_next = false;
            return;
        }

        // Ring shift: [2] is this edge, [1] the previous one.
        self.edge_ts[1] = self.edge_ts[2];
        self.edge_ts[2] = now_us;

        if self.skip_next {
            self.skip_next = false;
            return;
        }

        // Low-pass glitch filter: an interval shorter than any valid pulse
        // corrupts both the pulse it ends and the one it starts, so this
        // edge and the next are dropped. While searching there is no
        // calibration to judge by and every interval passes.
        if self.decoder.is_synchronized()
            && self.edge_ts[2].wrapping_sub(self.edge_ts[1]) < self.decoder.min_pulse()
        {
            self.skip_next = true;
            return;
        }

        // The pulse completed at the previous edge is now safe to decode.
        let duration = self.edge_ts[1].wrapping_sub(self.edge_ts[0]);
        self.edge_ts[0] = self.edge_ts[1];

        let was_searching = !self.decoder.is_synchronized();
        let completed = self.decoder.feed(duration);
        if was_searching && self.decoder.is_synchronized() {
            // Fresh sync gap: a repeat chain never spans a re-acquisition.
            self.repeats = 0;
        }

        if let Some(frame) = completed {
            self.aggregate(frame);
        }
        self.publish_progress();
    }

    /// Repeat aggregation and dispatch for one validated frame.
    fn aggregate(&mut self, frame: DecodedFrame) {
        match &self.previous {
            Some(prev) if prev.same_command(&frame) => {}
            _ => {
                self.repeats = 0;
                self.previous = Some(frame.clone());
            }
        }
        self.repeats += 1;

        if self.repeats >= self.min_repeats {
            if !self.in_callback {
                self.in_callback = true;
                (self.callback)(frame);
                self.in_callback = false;
            }
            // The decoder is already searching: a dispatched frame always
            // forces re-acquisition of sync.
        } else {
            // Keep listening for the next repeat of this burst; its stop gap
            // doubles as framing, no new sync gap is transmitted.
            self.decoder.rearm();
        }
    }

    fn publish_progress(&self) {
        self.shared
            .progress
            .store(self.decoder.bits_done(), Ordering::Relaxed);
    }
}
