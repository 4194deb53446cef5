use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use crate::flow::key::Flow;

/// Opaque label for a flow record. Unique for the life of the process,
/// never used for ordering by the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlowId(pub u64);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out flow ids. Owned by the flow table so ids stay unique across
/// windows without any global state.
#[derive(Debug, Default)]
pub struct FlowIdGenerator {
    next: AtomicU64,
}

impl FlowIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> FlowId {
        FlowId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Aggregated statistics for one canonical flow within one window.
#[derive(Debug, Clone)]
pub struct FlowRecord {
    pub id: FlowId,
    /// Direction of the first packet seen for this conversation.
    pub flow: Flow,
    pub packet_count: u64,
    pub byte_count: u64,
    /// Arrival times in microseconds, in arrival order.
    pub timestamps: Vec<u64>,
    /// Filled in by the duration filter; zero until then.
    pub duration_us: u64,
}

impl FlowRecord {
    pub fn new(id: FlowId, flow: Flow) -> Self {
        Self {
            id,
            flow,
            packet_count: 0,
            byte_count: 0,
            timestamps: Vec::new(),
            duration_us: 0,
        }
    }

    pub fn record_packet(&mut self, length: u64, timestamp_us: u64) {
        self.packet_count += 1;
        self.byte_count += length;
        self.timestamps.push(timestamp_us);
    }

    pub fn first_timestamp(&self) -> Option<u64> {
        self.timestamps.first().copied()
    }

    /// Last minus first arrival, or zero with fewer than two packets.
    pub fn compute_duration(&self) -> u64 {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) if self.timestamps.len() >= 2 => last.saturating_sub(*first),
            _ => 0,
        }
    }
}
