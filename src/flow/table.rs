use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use crate::capture::PacketInfo;
use crate::flow::key::{Flow, FlowKey};
use crate::flow::record::{FlowIdGenerator, FlowRecord};

/// The live per-window flow table.
///
/// Ingestion and the window scheduler share one table through an `Arc`.
/// A single mutex covers the lookup-create-update of each packet and the
/// detach-and-replace at window rollover, so every packet lands in exactly
/// one snapshot.
#[derive(Debug, Default)]
pub struct FlowTable {
    flows: Mutex<HashMap<FlowKey, FlowRecord>>,
    ids: FlowIdGenerator,
}

impl FlowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one decoded packet.
    pub fn observe(&self, packet: &PacketInfo) {
        self.observe_flow(&packet.flow, packet.length, packet.timestamp_us);
    }

    /// Account one packet of `flow`, creating its record on first sight.
    pub fn observe_flow(&self, flow: &Flow, length: u64, timestamp_us: u64) {
        let key = flow.key();
        let mut flows = self.lock();
        let record = flows
            .entry(key)
            .or_insert_with(|| FlowRecord::new(self.ids.next_id(), flow.clone()));
        record.record_packet(length, timestamp_us);
    }

    /// Detach the current contents and leave an empty table behind.
    ///
    /// Records come back ordered by id, i.e. by creation order.
    pub fn take_snapshot(&self) -> Vec<FlowRecord> {
        let detached = std::mem::take(&mut *self.lock());
        let mut records: Vec<FlowRecord> = detached.into_values().collect();
        records.sort_by_key(|record| record.id);
        records
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FlowKey, FlowRecord>> {
        // A panic mid-update can at worst lose that one packet's update.
        self.flows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
