//! In-memory versioned heap
//!
//! A minimal multi-version row store implementing `TupleStore`. It
//! exists to exercise the relocation protocol end to end: versions carry
//! inserting/deleting transaction and command ids, deletes leave a
//! forwarding link when they were updates, and lock/delete attempts
//! report the same outcome taxonomy a production store would.
//!
//! Slots are append-only; a locator stays valid for the lifetime of the
//! heap. There is no blocking: an in-progress conflicting writer is
//! reported as if the caller had waited for it to commit.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::partition::RelationId;
use crate::tuple::PhysicalLocator;

use super::{
    CommandId, DeleteKind, LockMode, MutationOutcome, StorageError, StorageResult, TransactionId,
    TupleStore,
};

#[derive(Debug, Clone)]
struct Mutation {
    xid: TransactionId,
    command: CommandId,
    /// Successor version when the mutation was an update
    successor: Option<PhysicalLocator>,
    changing_partition: bool,
}

#[derive(Debug, Clone)]
struct VersionSlot {
    columns: Map<String, Value>,
    inserted_by: TransactionId,
    deleted_by: Option<Mutation>,
    locked_by: Option<(TransactionId, LockMode)>,
}

#[derive(Debug, Default)]
struct HeapInner {
    partitions: HashMap<RelationId, Vec<VersionSlot>>,
    committed: HashSet<TransactionId>,
    aborted: HashSet<TransactionId>,
}

impl HeapInner {
    fn slot(&self, locator: PhysicalLocator) -> StorageResult<&VersionSlot> {
        self.partitions
            .get(&locator.relation)
            .ok_or(StorageError::UnknownRelation(locator.relation))?
            .get(locator.slot as usize)
            .ok_or(StorageError::InvalidLocator(locator))
    }

    fn slot_mut(&mut self, locator: PhysicalLocator) -> StorageResult<&mut VersionSlot> {
        self.partitions
            .get_mut(&locator.relation)
            .ok_or(StorageError::UnknownRelation(locator.relation))?
            .get_mut(locator.slot as usize)
            .ok_or(StorageError::InvalidLocator(locator))
    }

    /// Decides whether `xid` may modify the version, or what stands in
    /// the way. `None` means the version is live and unclaimed.
    fn modification_outcome(
        &self,
        slot: &VersionSlot,
        xid: TransactionId,
    ) -> Option<MutationOutcome> {
        let xmin = slot.inserted_by;
        if self.aborted.contains(&xmin) || (xmin != xid && !self.committed.contains(&xmin)) {
            return Some(MutationOutcome::Invisible);
        }

        match &slot.deleted_by {
            None => None,
            Some(m) if m.xid == xid => Some(MutationOutcome::SelfModified { command: m.command }),
            Some(m) if self.aborted.contains(&m.xid) => None,
            Some(m) => Some(MutationOutcome::Conflict {
                replacement: m.successor,
                writer: m.xid,
            }),
        }
    }
}

/// The shared heap. Sessions hold an `Arc` to it.
#[derive(Debug, Default)]
pub struct Heap {
    inner: Mutex<HeapInner>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, HeapInner> {
        self.inner.lock().unwrap()
    }

    /// Registers an empty partition.
    pub fn create_partition(&self, relation: RelationId) {
        self.inner().partitions.entry(relation).or_default();
    }

    /// Opens a session for one transaction.
    pub fn begin(self: &Arc<Self>, xid: TransactionId) -> HeapSession {
        HeapSession {
            heap: Arc::clone(self),
            xid,
        }
    }

    /// Marks a transaction committed.
    pub fn commit(&self, xid: TransactionId) {
        self.inner().committed.insert(xid);
    }

    /// Marks a transaction aborted.
    pub fn abort(&self, xid: TransactionId) {
        self.inner().aborted.insert(xid);
    }

    /// Rows of a partition as a fresh snapshot would see them: inserted
    /// by a committed transaction and not deleted by one.
    pub fn committed_rows(&self, relation: RelationId) -> StorageResult<Vec<Map<String, Value>>> {
        let inner = self.inner();
        let slots = inner
            .partitions
            .get(&relation)
            .ok_or(StorageError::UnknownRelation(relation))?;

        let mut rows = Vec::new();
        for slot in slots {
            if !inner.committed.contains(&slot.inserted_by) {
                continue;
            }
            let deleted = slot
                .deleted_by
                .as_ref()
                .is_some_and(|m| inner.committed.contains(&m.xid));
            if !deleted {
                rows.push(slot.columns.clone());
            }
        }
        Ok(rows)
    }

    /// Whether the delete of the version at `locator` was flagged as a
    /// partition migration. `None` if the version is not deleted.
    pub fn migration_marker(&self, locator: PhysicalLocator) -> StorageResult<Option<bool>> {
        let inner = self.inner();
        let slot = inner.slot(locator)?;
        Ok(slot.deleted_by.as_ref().map(|m| m.changing_partition))
    }

    /// The lock currently recorded on the version at `locator`.
    pub fn lock_holder(
        &self,
        locator: PhysicalLocator,
    ) -> StorageResult<Option<(TransactionId, LockMode)>> {
        let inner = self.inner();
        Ok(inner.slot(locator)?.locked_by)
    }
}

/// One transaction's handle on the heap.
#[derive(Debug)]
pub struct HeapSession {
    heap: Arc<Heap>,
    xid: TransactionId,
}

impl HeapSession {
    pub fn xid(&self) -> TransactionId {
        self.xid
    }

    /// Commits the session's transaction.
    pub fn commit(self) {
        self.heap.commit(self.xid);
    }

    /// Aborts the session's transaction.
    pub fn abort(self) {
        self.heap.abort(self.xid);
    }

    /// Inserts a new row version into a partition.
    pub fn insert(
        &mut self,
        relation: RelationId,
        columns: Map<String, Value>,
        _command: CommandId,
    ) -> StorageResult<PhysicalLocator> {
        let mut inner = self.heap.inner();
        let slots = inner
            .partitions
            .get_mut(&relation)
            .ok_or(StorageError::UnknownRelation(relation))?;
        let locator = PhysicalLocator::new(relation, slots.len() as u32);
        slots.push(VersionSlot {
            columns,
            inserted_by: self.xid,
            deleted_by: None,
            locked_by: None,
        });
        Ok(locator)
    }

    /// Replaces the version at `locator` with a successor in the same
    /// partition, leaving a forwarding link.
    ///
    /// This is the plain single-writer update path; contended updates
    /// surface as `WriteConflict` and belong to the lock/delete protocol
    /// instead.
    pub fn update(
        &mut self,
        locator: PhysicalLocator,
        columns: Map<String, Value>,
        command: CommandId,
    ) -> StorageResult<PhysicalLocator> {
        let mut inner = self.heap.inner();

        let outcome = {
            let slot = inner.slot(locator)?;
            inner.modification_outcome(slot, self.xid)
        };
        if outcome.is_some() {
            return Err(StorageError::WriteConflict(locator));
        }

        let slots = inner
            .partitions
            .get_mut(&locator.relation)
            .ok_or(StorageError::UnknownRelation(locator.relation))?;
        let successor = PhysicalLocator::new(locator.relation, slots.len() as u32);
        slots.push(VersionSlot {
            columns,
            inserted_by: self.xid,
            deleted_by: None,
            locked_by: None,
        });
        slots[locator.slot as usize].deleted_by = Some(Mutation {
            xid: self.xid,
            command,
            successor: Some(successor),
            changing_partition: false,
        });
        Ok(successor)
    }

    /// Reads the column values of the version at `locator`.
    pub fn read(&self, locator: PhysicalLocator) -> StorageResult<Map<String, Value>> {
        let inner = self.heap.inner();
        Ok(inner.slot(locator)?.columns.clone())
    }

    /// Versions of a partition visible to this transaction right now.
    pub fn snapshot_scan(
        &self,
        relation: RelationId,
    ) -> StorageResult<Vec<(PhysicalLocator, Map<String, Value>)>> {
        let inner = self.heap.inner();
        let slots = inner
            .partitions
            .get(&relation)
            .ok_or(StorageError::UnknownRelation(relation))?;

        let mut rows = Vec::new();
        for (idx, slot) in slots.iter().enumerate() {
            let xmin = slot.inserted_by;
            if xmin != self.xid && !inner.committed.contains(&xmin) {
                continue;
            }
            if inner.aborted.contains(&xmin) {
                continue;
            }
            let deleted = slot
                .deleted_by
                .as_ref()
                .is_some_and(|m| m.xid == self.xid || inner.committed.contains(&m.xid));
            if deleted {
                continue;
            }
            rows.push((
                PhysicalLocator::new(relation, idx as u32),
                slot.columns.clone(),
            ));
        }
        Ok(rows)
    }
}

impl TupleStore for HeapSession {
    fn lock_row(
        &mut self,
        locator: PhysicalLocator,
        _command: CommandId,
        mode: LockMode,
    ) -> StorageResult<MutationOutcome> {
        let mut inner = self.heap.inner();
        let outcome = {
            let slot = inner.slot(locator)?;
            inner.modification_outcome(slot, self.xid)
        };
        if let Some(outcome) = outcome {
            return Ok(outcome);
        }
        inner.slot_mut(locator)?.locked_by = Some((self.xid, mode));
        Ok(MutationOutcome::Ok)
    }

    fn delete_row(
        &mut self,
        locator: PhysicalLocator,
        command: CommandId,
        kind: DeleteKind,
    ) -> StorageResult<MutationOutcome> {
        let mut inner = self.heap.inner();
        let outcome = {
            let slot = inner.slot(locator)?;
            inner.modification_outcome(slot, self.xid)
        };
        if let Some(outcome) = outcome {
            return Ok(outcome);
        }
        inner.slot_mut(locator)?.deleted_by = Some(Mutation {
            xid: self.xid,
            command,
            successor: None,
            changing_partition: kind == DeleteKind::ChangingPartition,
        });
        Ok(MutationOutcome::Ok)
    }
}
