use std::sync::{Arc, RwLock};

use crate::transit_data::TransitData;

/// Hands out the current timetable snapshot and atomically replaces it
/// when a refresh completes.
///
/// A query captures the snapshot once with [`SnapshotReader::snapshot`]
/// and runs against that capture until it returns ; publishing a new
/// snapshot never disturbs in-flight queries, and published snapshots are
/// never mutated.
pub struct SnapshotPublisher {
    current: Arc<RwLock<Arc<TransitData>>>,
}

#[derive(Clone)]
pub struct SnapshotReader {
    current: Arc<RwLock<Arc<TransitData>>>,
}

impl SnapshotPublisher {
    pub fn new(data: TransitData) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(data))),
        }
    }

    pub fn publish(&self, data: TransitData) {
        let new_snapshot = Arc::new(data);
        match self.current.write() {
            Ok(mut guard) => *guard = new_snapshot,
            Err(poisoned) => *poisoned.into_inner() = new_snapshot,
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            current: Arc::clone(&self.current),
        }
    }
}

impl SnapshotReader {
    pub fn snapshot(&self) -> Arc<TransitData> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}
