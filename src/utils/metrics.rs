//! Translation Metrics
//!
//! Atomic counters describing what the bridge did with the traffic it saw.
//! One [`Metrics`] lives inside the shared bridge context; every connection
//! records into it concurrently. Each connection also keeps its own
//! [`UpdateTimeStats`] over recent pump durations.

use crate::time::Milliseconds;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Pump durations kept by [`UpdateTimeStats`].
pub const UPDATE_TIME_SAMPLES: usize = 500;

/// Why a message was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No handler registered for the opcode
    UnknownOpcode,
    /// The handler rejected the body
    HandlerRejected,
    /// The destination encoder could not express the message
    EncoderRejected,
}

/// Counters shared by every connection
#[derive(Debug)]
pub struct Metrics {
    /// Connections opened
    pub connections_total: AtomicU64,
    /// Connections currently open
    pub connections_active: AtomicU64,
    /// Complete frames taken off either input
    pub frames_decoded: AtomicU64,
    /// Frames written to either output
    pub frames_encoded: AtomicU64,
    /// Canonical messages produced by handlers
    pub messages_translated: AtomicU64,
    pub dropped_unknown_opcode: AtomicU64,
    pub dropped_handler: AtomicU64,
    pub dropped_encoder: AtomicU64,
    /// Connections closed by a fatal error
    pub fatal_errors: AtomicU64,
    pub bytes_in: AtomicU64,
    pub bytes_out: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            frames_decoded: AtomicU64::new(0),
            frames_encoded: AtomicU64::new(0),
            messages_translated: AtomicU64::new(0),
            dropped_unknown_opcode: AtomicU64::new(0),
            dropped_handler: AtomicU64::new(0),
            dropped_encoder: AtomicU64::new(0),
            fatal_errors: AtomicU64::new(0),
            bytes_in: AtomicU64::new(0),
            bytes_out: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn frame_decoded(&self, byte_count: u64) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn frame_encoded(&self, byte_count: u64) {
        self.frames_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_out.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn messages_translated(&self, count: u64) {
        self.messages_translated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn message_dropped(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::UnknownOpcode => &self.dropped_unknown_opcode,
            DropReason::HandlerRejected => &self.dropped_handler,
            DropReason::EncoderRejected => &self.dropped_encoder,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fatal_error(&self) {
        self.fatal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            messages_translated: self.messages_translated.load(Ordering::Relaxed),
            dropped_unknown_opcode: self.dropped_unknown_opcode.load(Ordering::Relaxed),
            dropped_handler: self.dropped_handler.load(Ordering::Relaxed),
            dropped_encoder: self.dropped_encoder.load(Ordering::Relaxed),
            fatal_errors: self.fatal_errors.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_total = snapshot.connections_total,
            connections_active = snapshot.connections_active,
            frames_decoded = snapshot.frames_decoded,
            frames_encoded = snapshot.frames_encoded,
            messages_translated = snapshot.messages_translated,
            messages_dropped = snapshot.messages_dropped(),
            fatal_errors = snapshot.fatal_errors,
            bytes_in = snapshot.bytes_in,
            bytes_out = snapshot.bytes_out,
            uptime_seconds = snapshot.uptime_seconds,
            "Bridge metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub frames_decoded: u64,
    pub frames_encoded: u64,
    pub messages_translated: u64,
    pub dropped_unknown_opcode: u64,
    pub dropped_handler: u64,
    pub dropped_encoder: u64,
    pub fatal_errors: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    pub fn messages_dropped(&self) -> u64 {
        self.dropped_unknown_opcode + self.dropped_handler + self.dropped_encoder
    }
}

/// Rolling statistics over the most recent pump durations.
#[derive(Debug, Clone)]
pub struct UpdateTimeStats {
    table: Vec<Milliseconds>,
    index: usize,
    total: Milliseconds,
    average: Milliseconds,
    max: Milliseconds,
    max_current_table: Milliseconds,
    max_last_table: Milliseconds,
}

impl UpdateTimeStats {
    pub fn new() -> Self {
        Self {
            table: vec![Milliseconds::ZERO; UPDATE_TIME_SAMPLES],
            index: 0,
            total: Milliseconds::ZERO,
            average: Milliseconds::ZERO,
            max: Milliseconds::ZERO,
            max_current_table: Milliseconds::ZERO,
            max_last_table: Milliseconds::ZERO,
        }
    }

    /// Record one duration; negative values count as zero.
    pub fn record(&mut self, diff: Milliseconds) {
        let diff = diff.max(Milliseconds::ZERO);
        self.total = Milliseconds(self.total.0 - self.table[self.index].0 + diff.0);
        self.table[self.index] = diff;
        self.max = self.max.max(diff);
        self.max_current_table = self.max_current_table.max(diff);

        self.index += 1;
        if self.index >= UPDATE_TIME_SAMPLES {
            self.index = 0;
            self.max_last_table = self.max_current_table;
            self.max_current_table = Milliseconds::ZERO;
        }

        if self.table[UPDATE_TIME_SAMPLES - 1] != Milliseconds::ZERO {
            self.average = Milliseconds(self.total.0 / UPDATE_TIME_SAMPLES as i64);
        } else if self.index != 0 {
            self.average = Milliseconds(self.total.0 / self.index as i64);
        }
    }

    pub fn record_elapsed(&mut self, elapsed: Duration) {
        let millis = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        self.record(Milliseconds(millis));
    }

    /// Mean over the window, or over the samples so far until it fills.
    pub fn average(&self) -> Milliseconds {
        self.average
    }

    /// Mean with each sample weighted by its own length.
    pub fn time_weighted_average(&self) -> Milliseconds {
        let (sum, weight) = self.table.iter().fold((0i128, 0i128), |(sum, weight), diff| {
            let diff = i128::from(diff.0);
            (sum + diff * diff, weight + diff)
        });
        if weight == 0 {
            return Milliseconds::ZERO;
        }
        Milliseconds(i64::try_from(sum / weight).unwrap_or(i64::MAX))
    }

    /// Longest duration ever recorded.
    pub fn max(&self) -> Milliseconds {
        self.max
    }

    /// Longest duration in the current or the previous window.
    pub fn max_recent(&self) -> Milliseconds {
        self.max_current_table.max(self.max_last_table)
    }

    pub fn last(&self) -> Milliseconds {
        let index = self.index.checked_sub(1).unwrap_or(UPDATE_TIME_SAMPLES - 1);
        self.table[index]
    }

    pub fn log_summary(&self) {
        debug!(
            average_ms = self.average.0,
            weighted_average_ms = self.time_weighted_average().0,
            max_ms = self.max.0,
            max_recent_ms = self.max_recent().0,
            "pump durations"
        );
    }
}

impl Default for UpdateTimeStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_reasons_counted_separately() {
        let metrics = Metrics::new();
        metrics.message_dropped(DropReason::UnknownOpcode);
        metrics.message_dropped(DropReason::UnknownOpcode);
        metrics.message_dropped(DropReason::EncoderRejected);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dropped_unknown_opcode, 2);
        assert_eq!(snapshot.dropped_handler, 0);
        assert_eq!(snapshot.dropped_encoder, 1);
        assert_eq!(snapshot.messages_dropped(), 3);
    }

    #[test]
    fn test_connection_gauge() {
        let metrics = Metrics::new();
        metrics.connection_opened();
        metrics.connection_opened();
        metrics.connection_closed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_total, 2);
        assert_eq!(snapshot.connections_active, 1);
    }

    #[test]
    fn test_frame_byte_totals() {
        let metrics = Metrics::new();
        metrics.frame_decoded(10);
        metrics.frame_encoded(24);
        metrics.frame_encoded(6);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_decoded, 1);
        assert_eq!(snapshot.bytes_in, 10);
        assert_eq!(snapshot.frames_encoded, 2);
        assert_eq!(snapshot.bytes_out, 30);
    }

    #[test]
    fn test_update_time_average_before_window_fills() {
        let mut stats = UpdateTimeStats::new();
        stats.record(Milliseconds(10));
        stats.record(Milliseconds(30));

        assert_eq!(stats.average(), Milliseconds(20));
        assert_eq!(stats.last(), Milliseconds(30));
        assert_eq!(stats.max(), Milliseconds(30));
        // (100 + 900) / 40
        assert_eq!(stats.time_weighted_average(), Milliseconds(25));
    }

    #[test]
    fn test_update_time_window_rolls_over() {
        let mut stats = UpdateTimeStats::new();
        stats.record(Milliseconds(90));
        for _ in 1..UPDATE_TIME_SAMPLES {
            stats.record(Milliseconds(2));
        }
        assert_eq!(stats.last(), Milliseconds(2));
        assert_eq!(stats.max_recent(), Milliseconds(90));

        // The 90 ms sample is overwritten but remains the all-time and last-window max.
        stats.record(Milliseconds(4));
        assert_eq!(stats.average(), Milliseconds((4 + 2 * 499) / 500));
        assert_eq!(stats.max(), Milliseconds(90));
        assert_eq!(stats.max_recent(), Milliseconds(90));
        assert_eq!(stats.last(), Milliseconds(4));
    }

    #[test]
    fn test_update_time_empty_and_negative() {
        let mut stats = UpdateTimeStats::new();
        assert_eq!(stats.time_weighted_average(), Milliseconds::ZERO);
        assert_eq!(stats.last(), Milliseconds::ZERO);

        stats.record(Milliseconds(-5));
        stats.record_elapsed(Duration::from_millis(8));
        assert_eq!(stats.last(), Milliseconds(8));
        assert_eq!(stats.average(), Milliseconds(4));
    }
}
