//! In-memory [`Store`] used as a test double.
//!
//! Records every call in a journal, can be told to fail specific calls, and
//! snapshots its tables on `begin_phase` so `rollback_phase` restores them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::policy::{EntityKind, SyncEntity};
use super::store::{EntityStore, SaleStore, Side, Store};
use crate::error::{Error, Result};
use crate::models::{Category, Product, ProductVariant, Sale, SaleItem, Unit};

/// Kind of store call, as recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Connect,
    Begin,
    Commit,
    Rollback,
    FindAll,
    Insert,
    Update,
    Delete,
    FindItems,
    InsertItem,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::FindAll => "find_all",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::FindItems => "find_items",
            Self::InsertItem => "insert_item",
        })
    }
}

/// One journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    /// Entity type touched, `None` for connection and transaction calls
    pub kind: Option<EntityKind>,
    /// Record id for point operations
    pub id: Option<i64>,
}

/// A call pattern that should fail; `None` fields match anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FailureRule {
    op: StoreOp,
    kind: Option<EntityKind>,
    id: Option<i64>,
}

impl FailureRule {
    fn matches(&self, call: &StoreCall) -> bool {
        self.op == call.op
            && self.kind.is_none_or(|kind| call.kind == Some(kind))
            && self.id.is_none_or(|id| call.id == Some(id))
    }
}

/// Backing tables of a [`MemoryStore`]
#[doc(hidden)]
#[derive(Debug, Clone, Default)]
pub struct Tables {
    units: BTreeMap<i64, Unit>,
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    variants: BTreeMap<i64, ProductVariant>,
    sales: BTreeMap<i64, Sale>,
    sale_items: BTreeMap<i64, SaleItem>,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    snapshot: Option<Tables>,
    next_item_id: i64,
    journal: Vec<StoreCall>,
    failures: Vec<FailureRule>,
    /// One-shot failures: calls of `op` left before the failing one
    countdowns: Vec<(StoreOp, usize)>,
}

/// Records kept by [`MemoryStore`], one table per type
pub trait MemoryEntity: SyncEntity {
    #[doc(hidden)]
    fn table(tables: &Tables) -> &BTreeMap<i64, Self>;
    #[doc(hidden)]
    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<i64, Self>;
}

macro_rules! memory_entity {
    ($entity:ty, $field:ident) => {
        impl MemoryEntity for $entity {
            fn table(tables: &Tables) -> &BTreeMap<i64, Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut BTreeMap<i64, Self> {
                &mut tables.$field
            }
        }
    };
}

memory_entity!(Unit, units);
memory_entity!(Category, categories);
memory_entity!(Product, products);
memory_entity!(ProductVariant, variants);
memory_entity!(Sale, sales);

/// Thread-safe in-memory store for one tenant
#[derive(Debug)]
pub struct MemoryStore {
    side: Side,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store playing the given side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            state: Mutex::new(State {
                next_item_id: 1,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put records in place without journaling
    pub fn seed<E: MemoryEntity>(&self, records: impl IntoIterator<Item = E>) {
        let mut state = self.lock();
        let table = E::table_mut(&mut state.tables);
        for record in records {
            table.insert(record.id(), record);
        }
    }

    /// Put sale items in place without journaling, keeping their ids
    pub fn seed_sale_items(&self, items: impl IntoIterator<Item = SaleItem>) {
        let mut state = self.lock();
        for item in items {
            state.next_item_id = state.next_item_id.max(item.id + 1);
            state.tables.sale_items.insert(item.id, item);
        }
    }

    /// Current records of one type, ordered by id
    pub fn records<E: MemoryEntity>(&self) -> Vec<E> {
        E::table(&self.lock().tables).values().cloned().collect()
    }

    /// Current record with the given id
    pub fn record<E: MemoryEntity>(&self, id: i64) -> Option<E> {
        E::table(&self.lock().tables).get(&id).cloned()
    }

    /// Every stored item of a sale, ordered by item id
    pub fn sale_items(&self, sale_id: i64) -> Vec<SaleItem> {
        self.lock()
            .tables
            .sale_items
            .values()
            .filter(|item| item.sale_id == sale_id)
            .cloned()
            .collect()
    }

    /// Calls made so far, oldest first
    pub fn journal(&self) -> Vec<StoreCall> {
        self.lock().journal.clone()
    }

    /// Forget recorded calls
    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Make every `op` on `kind` fail
    pub fn fail(&self, op: StoreOp, kind: EntityKind) {
        self.lock().failures.push(FailureRule {
            op,
            kind: Some(kind),
            id: None,
        });
    }

    /// Make `op` fail only for the record with `id`
    pub fn fail_record(&self, op: StoreOp, kind: EntityKind, id: i64) {
        self.lock().failures.push(FailureRule {
            op,
            kind: Some(kind),
            id: Some(id),
        });
    }

    /// Make `check_connection` fail
    pub fn fail_connection(&self) {
        self.lock().failures.push(FailureRule {
            op: StoreOp::Connect,
            kind: None,
            id: None,
        });
    }

    /// Make the `nth` upcoming `op` call fail once, counting from 1.
    ///
    /// Phase hooks carry no entity kind, so this is how a single phase's
    /// `Begin` or `Commit` is targeted.
    pub fn fail_nth(&self, op: StoreOp, nth: usize) {
        self.lock().countdowns.push((op, nth.max(1)));
    }

    /// Drop every failure rule
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failures.clear();
        state.countdowns.clear();
    }

    /// Journal the call, then fail it if a rule matches
    fn record_call(
        &self,
        state: &mut State,
        op: StoreOp,
        kind: Option<EntityKind>,
        id: Option<i64>,
    ) -> Result<()> {
        let call = StoreCall { op, kind, id };
        state.journal.push(call);
        let mut tripped = false;
        state.countdowns.retain_mut(|(pending_op, remaining)| {
            if *pending_op != op {
                return true;
            }
            *remaining -= 1;
            if *remaining == 0 {
                tripped = true;
                return false;
            }
            true
        });
        if tripped || state.failures.iter().any(|rule| rule.matches(&call)) {
            let target = kind.map_or_else(|| self.side.to_string(), |kind| kind.to_string());
            return Err(Error::Database(format!("injected {op} failure on {target}")));
        }
        Ok(())
    }
}

impl<E: MemoryEntity> EntityStore<E> for MemoryStore {
    async fn find_all(&self) -> Result<Vec<E>> {
        let mut state = self.lock();
        self.record_call(&mut state, StoreOp::FindAll, Some(E::KIND), None)?;
        Ok(E::table(&state.tables).values().cloned().collect())
    }

    async fn insert(&self, entity: &E) -> Result<i64> {
        let mut state = self.lock();
        let id = entity.id();
        self.record_call(&mut state, StoreOp::Insert, Some(E::KIND), Some(id))?;
        let table = E::table_mut(&mut state.tables);
        if table.contains_key(&id) {
            return Err(Error::Database(format!(
                "UNIQUE constraint failed: {} #{id}",
                E::KIND
            )));
        }
        table.insert(id, entity.clone());
        Ok(id)
    }

    async fn update(&self, entity: &E) -> Result<()> {
        let mut state = self.lock();
        let id = entity.id();
        self.record_call(&mut state, StoreOp::Update, Some(E::KIND), Some(id))?;
        match E::table_mut(&mut state.tables).get_mut(&id) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("{} #{id}", E::KIND))),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut state = self.lock();
        self.record_call(&mut state, StoreOp::Delete, Some(E::KIND), Some(id))?;
        if E::table_mut(&mut state.tables).remove(&id).is_none() {
            return Err(Error::NotFound(format!("{} #{id}", E::KIND)));
        }
        if E::KIND == EntityKind::Sale {
            state.tables.sale_items.retain(|_, item| item.sale_id != id);
        }
        Ok(())
    }
}

impl SaleStore for MemoryStore {
    async fn find_items(&self, sale_id: i64) -> Result<Vec<SaleItem>> {
        let mut state = self.lock();
        self.record_call(
            &mut state,
            StoreOp::FindItems,
            Some(EntityKind::Sale),
            Some(sale_id),
        )?;
        Ok(state
            .tables
            .sale_items
            .values()
            .filter(|item| item.sale_id == sale_id)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, item: &SaleItem) -> Result<i64> {
        let mut state = self.lock();
        self.record_call(
            &mut state,
            StoreOp::InsertItem,
            Some(EntityKind::Sale),
            Some(item.sale_id),
        )?;
        if !state.tables.sales.contains_key(&item.sale_id) {
            return Err(Error::Database(format!(
                "FOREIGN KEY constraint failed: sale #{}",
                item.sale_id
            )));
        }
        let id = state.next_item_id;
        state.next_item_id += 1;
        state
            .tables
            .sale_items
            .insert(id, SaleItem { id, ..item.clone() });
        Ok(id)
    }
}

impl Store for MemoryStore {
    fn side(&self) -> Side {
        self.side
    }

    async fn check_connection(&self) -> Result<()> {
        let mut state = self.lock();
        self.record_call(&mut state, StoreOp::Connect, None, None)
    }

    async fn begin_phase(&self) -> Result<()> {
        let mut state = self.lock();
        self.record_call(&mut state, StoreOp::Begin, None, None)?;
        if state.snapshot.is_some() {
            return Err(Error::Database(
                "cannot start a transaction within a transaction".into(),
            ));
        }
        state.snapshot = Some(state.tables.clone());
        Ok(())
    }

    async fn commit_phase(&self) -> Result<()> {
        let mut state = self.lock();
        self.record_call(&mut state, StoreOp::Commit, None, None)?;
        state.snapshot = None;
        Ok(())
    }

    async fn rollback_phase(&self) -> Result<()> {
        let mut state = self.lock();
        self.record_call(&mut state, StoreOp::Rollback, None, None)?;
        if let Some(snapshot) = state.snapshot.take() {
            state.tables = snapshot;
        }
        Ok(())
    }
}
