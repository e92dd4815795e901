//! Shared harness for the router integration suites
//!
//! Builds a two-partition table (`[0,10)` and `[10,20)` over an integer
//! `id` key) on the in-memory heap and wires a full UPDATE statement
//! around the router: materialized subplan scan, EPQ re-check against
//! the latest committed version, write dispatch with range routing, and
//! a recording trigger set.

use std::rc::Rc;
use std::sync::Arc;

use serde_json::{Map, Value};

use partroute::executor::{
    CmdKind, DriverLoop, DriverState, ExecContext, OperationDispatch, QualRecheck, Router,
    RouterResult, RowSource,
};
use partroute::partition::{PartitionBounds, RelationId, ResultRelation, TriggerFlags};
use partroute::plan::{router_plan, PlanCost, RouterConfig, SubplanDesc};
use partroute::storage::heap::{Heap, HeapSession};
use partroute::storage::{CommandId, IsolationLevel, TransactionId};
use partroute::trigger::{
    BeforeRowOutcome, TriggerEvent, TriggerResult, TriggerSet, TriggerTiming,
};
use partroute::tuple::{PhysicalLocator, Row};

pub const PART_LOW: RelationId = RelationId(1);
pub const PART_HIGH: RelationId = RelationId(2);

pub type Columns = Map<String, Value>;
pub type RowPred = Rc<dyn Fn(&Columns) -> bool>;
pub type RowProj = Rc<dyn Fn(&Columns) -> Columns>;

// =============================================================================
// Fixture
// =============================================================================

pub struct Fixture {
    pub heap: Arc<Heap>,
}

impl Fixture {
    pub fn new() -> Self {
        let heap = Arc::new(Heap::new());
        heap.create_partition(PART_LOW);
        heap.create_partition(PART_HIGH);
        Self { heap }
    }

    pub fn low(&self) -> ResultRelation {
        ResultRelation::ordinary(PART_LOW, "events_low", low_bounds())
    }

    /// Routing table the insert dispatch consults.
    pub fn routes(&self) -> Vec<(RelationId, PartitionBounds)> {
        vec![(PART_LOW, low_bounds()), (PART_HIGH, high_bounds())]
    }

    /// Inserts a committed row into a partition.
    pub fn seed(&self, xid: u64, relation: RelationId, key: i64, payload: &str) -> PhysicalLocator {
        let mut session = self.heap.begin(TransactionId(xid));
        let locator = session
            .insert(relation, columns(key, payload), CommandId(0))
            .unwrap();
        session.commit();
        locator
    }

    /// Committed `id` values of a partition, sorted.
    pub fn keys(&self, relation: RelationId) -> Vec<i64> {
        let mut keys: Vec<i64> = self
            .heap
            .committed_rows(relation)
            .unwrap()
            .iter()
            .map(|row| row["id"].as_i64().unwrap())
            .collect();
        keys.sort_unstable();
        keys
    }
}

fn low_bounds() -> PartitionBounds {
    PartitionBounds::range("id", Some(0), Some(10))
}

fn high_bounds() -> PartitionBounds {
    PartitionBounds::range("id", Some(10), Some(20))
}

pub fn columns(key: i64, payload: &str) -> Columns {
    let mut m = Map::new();
    m.insert("id".to_string(), Value::from(key));
    m.insert("payload".to_string(), Value::from(payload));
    m
}

// =============================================================================
// Recording trigger set
// =============================================================================

#[derive(Default)]
pub struct RecordingTriggers {
    pub fired: Vec<(TriggerTiming, TriggerEvent)>,
    pub suppress_update: bool,
    pub suppress_delete: bool,
}

impl TriggerSet for RecordingTriggers {
    fn fire_before_row(
        &mut self,
        event: TriggerEvent,
        _relation: RelationId,
        _row: &Row,
    ) -> TriggerResult<BeforeRowOutcome> {
        self.fired.push((TriggerTiming::Before, event));
        let suppress = match event {
            TriggerEvent::Update => self.suppress_update,
            TriggerEvent::Delete => self.suppress_delete,
        };
        if suppress {
            Ok(BeforeRowOutcome::Suppress)
        } else {
            Ok(BeforeRowOutcome::Proceed)
        }
    }

    fn fire_after_row(
        &mut self,
        event: TriggerEvent,
        _relation: RelationId,
        _row: &Row,
    ) -> TriggerResult<()> {
        self.fired.push((TriggerTiming::After, event));
        Ok(())
    }
}

// =============================================================================
// Statement plumbing
// =============================================================================

/// Materialized subplan: the statement's scan snapshot, taken when the
/// statement was prepared.
pub struct MaterializedSource {
    rows: Vec<Row>,
    next: usize,
}

impl MaterializedSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, next: 0 }
    }
}

impl RowSource for MaterializedSource {
    fn next_row(&mut self) -> RouterResult<Option<Row>> {
        let row = self.rows.get(self.next).cloned();
        self.next += 1;
        Ok(row)
    }

    fn rescan(&mut self) -> RouterResult<()> {
        self.next = 0;
        Ok(())
    }
}

/// EPQ: reads the replacement version, re-applies the WHERE clause, and
/// re-projects the SET clause onto it.
pub struct HeapRecheck {
    session: HeapSession,
    where_clause: RowPred,
    set_clause: RowProj,
}

impl QualRecheck for HeapRecheck {
    fn recheck(&mut self, locator: PhysicalLocator) -> RouterResult<Option<Row>> {
        let current = self.session.read(locator)?;
        if !(self.where_clause)(&current) {
            return Ok(None);
        }
        Ok(Some(Row::with_locator((self.set_clause)(&current), locator)))
    }
}

/// Write dispatch: in-place updates through the heap's update path,
/// relocated rows routed by key range.
pub struct HeapDispatch {
    heap: Arc<Heap>,
    xid: TransactionId,
    command: CommandId,
    routes: Vec<(RelationId, PartitionBounds)>,
    /// Every dispatched write, in order
    pub log: Vec<(CmdKind, i64)>,
}

impl HeapDispatch {
    fn key_of(row: &Row) -> i64 {
        row.get("id").and_then(|v| v.as_i64()).expect("integer id")
    }
}

impl OperationDispatch for HeapDispatch {
    fn update_in_place(&mut self, relation: RelationId, row: &Row) -> RouterResult<()> {
        let locator = row.locator().expect("dispatched update carries a locator");
        assert_eq!(locator.relation, relation, "update targets the active relation");
        let mut session = self.heap.begin(self.xid);
        session.update(locator, row.columns().clone(), self.command)?;
        self.log.push((CmdKind::Update, Self::key_of(row)));
        Ok(())
    }

    fn insert_routed(&mut self, row: &Row) -> RouterResult<()> {
        let key = Self::key_of(row);
        let destination = self
            .routes
            .iter()
            .find(|(_, bounds)| bounds.contains(key))
            .map(|(relation, _)| *relation)
            .expect("a partition accepts the key");
        let mut session = self.heap.begin(self.xid);
        session.insert(destination, row.columns().clone(), self.command)?;
        self.log.push((CmdKind::Insert, key));
        Ok(())
    }
}

/// An UPDATE statement, prepared (scan snapshot taken) but not yet run.
///
/// Splitting preparation from execution lets tests interleave another
/// session's commit between the two, which is how the concurrency
/// scenarios arise.
pub struct PreparedUpdate {
    heap: Arc<Heap>,
    source: ResultRelation,
    rows: Vec<Row>,
    where_clause: RowPred,
    set_clause: RowProj,
    xid: TransactionId,
    command: CommandId,
    isolation: IsolationLevel,
    routes: Vec<(RelationId, PartitionBounds)>,
}

impl PreparedUpdate {
    pub fn prepare(
        fixture: &Fixture,
        xid: u64,
        isolation: IsolationLevel,
        source: ResultRelation,
        where_clause: impl Fn(&Columns) -> bool + 'static,
        set_clause: impl Fn(&Columns) -> Columns + 'static,
    ) -> Self {
        let xid = TransactionId(xid);
        let where_clause: RowPred = Rc::new(where_clause);
        let set_clause: RowProj = Rc::new(set_clause);

        // The subplan projects the updated row and attaches the hidden
        // locator of the version it scanned
        let scan = fixture.heap.begin(xid);
        let mut rows = Vec::new();
        for (locator, cols) in scan.snapshot_scan(source.id).unwrap() {
            if where_clause(&cols) {
                rows.push(Row::with_locator(set_clause(&cols), locator));
            }
        }

        Self {
            heap: Arc::clone(&fixture.heap),
            source,
            rows,
            where_clause,
            set_clause,
            xid,
            command: CommandId(0),
            isolation,
            routes: fixture.routes(),
        }
    }

    /// Overrides the statement's command id.
    pub fn with_command(mut self, command: u32) -> Self {
        self.command = CommandId(command);
        self
    }

    /// Replaces the materialized subplan rows (used to fabricate
    /// duplicate-row scans).
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Runs the statement through the driver loop. Returns the dispatch
    /// log on success; the transaction is left uncommitted.
    pub fn execute<T: TriggerSet>(
        self,
        triggers: &mut T,
    ) -> RouterResult<Vec<(CmdKind, i64)>> {
        let subplan_desc = SubplanDesc {
            cost: PlanCost {
                startup: 0.0,
                total: 10.0,
                rows: self.rows.len() as f64,
                width: 16,
            },
            output_columns: vec!["id".to_string(), "payload".to_string()],
        };
        let node = router_plan(subplan_desc, 1, &RouterConfig::default());
        let plan = node.as_router().expect("router enabled by default");

        let router = Router::new(
            plan,
            self.source.clone(),
            Box::new(MaterializedSource::new(self.rows)),
        );

        let mut store = self.heap.begin(self.xid);
        let mut epq = HeapRecheck {
            session: self.heap.begin(self.xid),
            where_clause: self.where_clause,
            set_clause: self.set_clause,
        };
        let mut dispatch = HeapDispatch {
            heap: Arc::clone(&self.heap),
            xid: self.xid,
            command: self.command,
            routes: self.routes,
            log: Vec::new(),
        };

        let state = DriverState::new(CmdKind::Update, self.source.id, 1);
        {
            let mut driver = DriverLoop::new(router, state, &mut dispatch);
            let mut cx = ExecContext::new(
                &mut store,
                triggers,
                &mut epq,
                self.command,
                self.isolation,
            );
            driver.run_to_completion(&mut cx)?;
        }
        Ok(dispatch.log)
    }
}

/// Prepares and immediately executes an UPDATE under read committed.
pub fn run_update<T: TriggerSet>(
    fixture: &Fixture,
    xid: u64,
    source: ResultRelation,
    where_clause: impl Fn(&Columns) -> bool + 'static,
    set_clause: impl Fn(&Columns) -> Columns + 'static,
    triggers: &mut T,
) -> RouterResult<Vec<(CmdKind, i64)>> {
    PreparedUpdate::prepare(
        fixture,
        xid,
        IsolationLevel::ReadCommitted,
        source,
        where_clause,
        set_clause,
    )
    .execute(triggers)
}

/// A SET clause that assigns the key column.
pub fn set_key(key: i64) -> impl Fn(&Columns) -> Columns {
    move |cols| {
        let mut updated = cols.clone();
        updated.insert("id".to_string(), Value::from(key));
        updated
    }
}

/// A WHERE clause matching one key value.
pub fn where_key(key: i64) -> impl Fn(&Columns) -> bool {
    move |cols| cols.get("id").and_then(|v| v.as_i64()) == Some(key)
}

/// Flags every trigger kind the router consults.
pub fn all_triggers(relation: ResultRelation) -> ResultRelation {
    relation.with_triggers(TriggerFlags::all())
}
