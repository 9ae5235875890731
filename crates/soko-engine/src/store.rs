//! In-memory dispute store with per-aggregate locking.
//!
//! The map-level `RwLock` guards membership only; every record sits
//! behind its own `Mutex`, which is the per-dispute serialization point
//! for the whole engine. Nothing here is persistence — a deployment that
//! needs durability puts a repository behind the same shape.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use soko_core::DisputeId;
use soko_dispute::{Dispute, Timeline};
use soko_payout::DisbursementRequest;

/// Everything the engine tracks for one dispute.
#[derive(Debug)]
pub(crate) struct DisputeRecord {
    pub dispute: Dispute,
    pub timeline: Timeline,
    pub disbursement: Option<DisbursementRequest>,
}

impl DisputeRecord {
    pub fn new(dispute: Dispute) -> Self {
        Self {
            dispute,
            timeline: Timeline::new(),
            disbursement: None,
        }
    }
}

/// The engine's dispute map.
#[derive(Default)]
pub(crate) struct DisputeStore {
    records: RwLock<HashMap<DisputeId, Arc<Mutex<DisputeRecord>>>>,
}

impl DisputeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: DisputeRecord) {
        let id = record.dispute.id;
        self.records
            .write()
            .insert(id, Arc::new(Mutex::new(record)));
    }

    pub fn get(&self, id: &DisputeId) -> Option<Arc<Mutex<DisputeRecord>>> {
        self.records.read().get(id).cloned()
    }

    /// Snapshot of all record handles. The map lock is released before
    /// any record lock is taken, so iterating callers hold at most one
    /// dispute's lock at a time.
    pub fn snapshot(&self) -> Vec<Arc<Mutex<DisputeRecord>>> {
        self.records.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }
}
