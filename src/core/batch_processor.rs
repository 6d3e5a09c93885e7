//! Batch processing with account-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which processes a batch
//! of operation records concurrently while keeping the order of operations
//! on each account.
//!
//! # Partitioning
//!
//! A transfer touches two accounts, so records cannot simply be grouped by
//! their first account. The processor instead groups records into connected
//! components of the "touches the same account reference" relation: two
//! records share a partition when they are linked by a chain of records with
//! overlapping references. Each partition runs sequentially in batch order;
//! partitions run in parallel.
//!
//! ```text
//! open a, open b, transfer a->b, open c, credit c
//!   partition 1: open a, open b, transfer a->b
//!   partition 2: open c, credit c
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;

use super::engine::OperationEngine;
use crate::types::{LedgerError, OperationRecord};

/// Result of processing a single record
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The record that was processed
    pub record: OperationRecord,

    /// The result of processing (success or error)
    pub result: Result<(), LedgerError>,
}

/// Batch processor with account-based partitioning
///
/// Cloning is cheap: clones share the same engine.
#[derive(Clone)]
pub struct BatchProcessor {
    engine: Arc<OperationEngine>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<OperationEngine>) -> Self {
        Self { engine }
    }

    /// Split a batch into independent partitions
    ///
    /// Records keep their relative batch order inside each partition, and
    /// partitions are returned in the order of their first record.
    pub fn partition(&self, batch: Vec<OperationRecord>) -> Vec<Vec<OperationRecord>> {
        let mut sets = DisjointSets::default();
        let mut reference_slots: HashMap<String, usize> = HashMap::new();

        // One slot per record, linked to the slot of every reference it touches
        let mut record_slots = Vec::with_capacity(batch.len());
        for record in &batch {
            let slot = sets.add();
            for reference in record.references() {
                let reference_slot = *reference_slots
                    .entry(reference.clone())
                    .or_insert_with(|| sets.add());
                sets.union(slot, reference_slot);
            }
            record_slots.push(slot);
        }

        let mut partition_of_root: HashMap<usize, usize> = HashMap::new();
        let mut partitions: Vec<Vec<OperationRecord>> = Vec::new();
        for (record, slot) in batch.into_iter().zip(record_slots) {
            let root = sets.find(slot);
            let index = *partition_of_root.entry(root).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[index].push(record);
        }
        partitions
    }

    /// Process one partition sequentially
    pub async fn process_partition(&self, records: Vec<OperationRecord>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let result = self.engine.process(record.clone());
            results.push(ProcessingResult { record, result });
        }
        results
    }

    /// Process a batch with one task per partition
    pub async fn process_batch(&self, batch: Vec<OperationRecord>) -> Vec<ProcessingResult> {
        let partitions = self.partition(batch);

        let mut tasks = Vec::with_capacity(partitions.len());
        for records in partitions {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_partition(records).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(partition_results) => results.extend(partition_results),
                Err(e) => error!(error = %e, "partition task failed"),
            }
        }
        results
    }
}

/// Union-find over slot indices
#[derive(Debug, Default)]
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn add(&mut self) -> usize {
        self.parent.push(self.parent.len());
        self.parent.len() - 1
    }

    fn find(&mut self, mut slot: usize) -> usize {
        while self.parent[slot] != slot {
            // Path halving
            self.parent[slot] = self.parent[self.parent[slot]];
            slot = self.parent[slot];
        }
        slot
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_b] = root_a;
        }
    }
}
