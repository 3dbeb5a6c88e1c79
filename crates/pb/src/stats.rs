//! Per-namespace record count and byte totals.

use pb_core::{Namespace, Record, Stats};
use pb_store::{StoreError, StoreTx};

use crate::error::{PasteError, Result};

/// Keeps the stats row in step with record mutations.
///
/// Every call runs inside the same transaction as the mutation it accounts
/// for, so count and bytes never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsAggregator {
    namespace: Namespace,
}

impl StatsAggregator {
    /// Create an aggregator for `namespace`.
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Count a newly stored record.
    pub fn record_insert(&self, tx: &mut dyn StoreTx, record: &Record) -> Result<()> {
        Ok(tx.adjust_stats(self.namespace, 1, byte_delta(record.len())?)?)
    }

    /// Remove a deleted record from the totals.
    pub fn record_delete(&self, tx: &mut dyn StoreTx, record: &Record) -> Result<()> {
        Ok(tx.adjust_stats(self.namespace, -1, -byte_delta(record.len())?)?)
    }

    /// Apply the byte delta of an in-place content change.
    pub fn record_replace(&self, tx: &mut dyn StoreTx, old_len: u64, new_len: u64) -> Result<()> {
        let delta = byte_delta(new_len)? - byte_delta(old_len)?;
        Ok(tx.adjust_stats(self.namespace, 0, delta)?)
    }

    /// Read the current totals.
    pub fn snapshot(&self, tx: &mut dyn StoreTx) -> Result<Stats> {
        Ok(tx.stats(self.namespace)?)
    }
}

fn byte_delta(len: u64) -> Result<i64> {
    i64::try_from(len)
        .map_err(|_| PasteError::Storage(StoreError::InvalidData(format!("record of {} bytes", len))))
}
