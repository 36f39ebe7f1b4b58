//! # Keyed Tables
//!
//! Durable keyed storage for contract rows.
//!
//! ## Layout
//!
//! Every table is addressed by `(code, scope, table)`:
//! - `code`: the contract that owns the table
//! - `scope`: the partition inside it (usually an owner / holder account)
//! - `table`: the table name
//!
//! Rows are stored bincode-packed under a `u64` primary key, together with the
//! account paying for their storage. A row may expose one non-unique
//! secondary key; the secondary index is an ordered set of
//! `(secondary, primary)` pairs kept in step with the rows on every mutation.
//!
//! ## Undo Sessions
//!
//! While a session is open every create / modify / remove is journalled.
//! `undo()` replays the journal backwards, restoring rows, index entries and
//! storage charges exactly; `commit()` drops it.
//!
//! `start_undo_session()` wraps a session in an [`UndoSession`] guard that
//! undoes on drop unless committed, so an unwinding caller never leaves a
//! half-written session behind.

use crate::errors::TableError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::Name;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, RangeInclusive};

/// Bytes billed per row on top of its packed size.
pub const ROW_OVERHEAD: i64 = 112;

/// Extra bytes billed for a row that carries a secondary key.
pub const SECONDARY_INDEX_OVERHEAD: i64 = 24;

// =============================================================================
// ROW TRAIT
// =============================================================================

/// A type that can live in a keyed table.
pub trait TableRow: Serialize + DeserializeOwned {
    /// Table name.
    const TABLE: Name;

    /// Unique key within a scope.
    fn primary_key(&self) -> u64;

    /// Non-unique ordering key, if the table keeps a secondary index.
    fn secondary_key(&self) -> Option<u64> {
        None
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Address of one table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TableId {
    pub code: Name,
    pub scope: Name,
    pub table: Name,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct StoredRow {
    payer: Name,
    secondary: Option<u64>,
    data: Vec<u8>,
}

impl StoredRow {
    fn billable_size(&self) -> i64 {
        let packed = i64::try_from(self.data.len()).unwrap_or(i64::MAX);
        let index = if self.secondary.is_some() {
            SECONDARY_INDEX_OVERHEAD
        } else {
            0
        };
        packed.saturating_add(ROW_OVERHEAD + index)
    }
}

#[derive(Clone, Debug, Default)]
struct TableData {
    rows: BTreeMap<u64, StoredRow>,
    by_secondary: BTreeSet<(u64, u64)>,
}

#[derive(Debug)]
enum UndoOp {
    Created {
        table: TableId,
        key: u64,
    },
    Modified {
        table: TableId,
        key: u64,
        previous: StoredRow,
    },
    Removed {
        table: TableId,
        key: u64,
        previous: StoredRow,
    },
}

/// All contract tables plus per-payer storage usage.
#[derive(Debug, Default)]
pub struct ChainDatabase {
    tables: BTreeMap<TableId, TableData>,
    ram_usage: HashMap<Name, i64>,
    session: Option<Vec<UndoOp>>,
}

fn charge(usage: &mut HashMap<Name, i64>, payer: Name, delta: i64) {
    let entry = usage.entry(payer).or_insert(0);
    *entry += delta;
    if *entry == 0 {
        usage.remove(&payer);
    }
}

impl ChainDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Start journalling mutations.
    pub fn begin_session(&mut self) -> Result<(), TableError> {
        if self.session.is_some() {
            return Err(TableError::SessionActive);
        }
        self.session = Some(Vec::new());
        Ok(())
    }

    /// Returns true while a session is open.
    #[must_use]
    pub fn in_session(&self) -> bool {
        self.session.is_some()
    }

    /// Keep all journalled mutations. Returns how many there were.
    pub fn commit(&mut self) -> usize {
        self.session.take().map_or(0, |ops| ops.len())
    }

    /// Revert all journalled mutations. Returns how many were reverted.
    pub fn undo(&mut self) -> usize {
        let Some(ops) = self.session.take() else {
            return 0;
        };
        let count = ops.len();
        for op in ops.into_iter().rev() {
            match op {
                UndoOp::Created { table, key } => {
                    self.raw_remove(table, key);
                }
                UndoOp::Modified {
                    table,
                    key,
                    previous,
                } => {
                    self.raw_replace(table, key, previous);
                }
                UndoOp::Removed {
                    table,
                    key,
                    previous,
                } => self.raw_insert(table, key, previous),
            }
        }
        count
    }

    /// Open a session owned by the returned guard.
    pub fn start_undo_session(&mut self) -> Result<UndoSession<'_>, TableError> {
        self.begin_session()?;
        Ok(UndoSession { db: self })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Storage bytes currently billed to `payer`.
    #[must_use]
    pub fn ram_usage(&self, payer: Name) -> i64 {
        self.ram_usage.get(&payer).copied().unwrap_or(0)
    }

    /// Total rows across all tables.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tables.values().map(|t| t.rows.len()).sum()
    }

    /// Returns true if the table holds at least one row.
    #[must_use]
    pub fn table_exists(&self, id: TableId) -> bool {
        self.tables.contains_key(&id)
    }

    /// Read-only typed view of `T`'s table in `(code, scope)`.
    #[must_use]
    pub fn table<T: TableRow>(&self, code: Name, scope: Name) -> TableView<'_, T> {
        TableView {
            db: self,
            id: TableId {
                code,
                scope,
                table: T::TABLE,
            },
            _row: PhantomData,
        }
    }

    /// Mutable typed view of `T`'s table in `(code, scope)`.
    pub fn table_mut<T: TableRow>(&mut self, code: Name, scope: Name) -> MultiIndex<'_, T> {
        MultiIndex {
            db: self,
            id: TableId {
                code,
                scope,
                table: T::TABLE,
            },
            _row: PhantomData,
        }
    }

    // =========================================================================
    // JOURNALLED WRITES
    // =========================================================================

    fn store(&mut self, id: TableId, key: u64, row: StoredRow) -> Result<(), TableError> {
        if self.raw_get(id, key).is_some() {
            return Err(TableError::DuplicatePrimaryKey {
                table: id.table,
                scope: id.scope,
                key,
            });
        }
        self.raw_insert(id, key, row);
        self.journal(UndoOp::Created { table: id, key });
        Ok(())
    }

    fn update(&mut self, id: TableId, key: u64, row: StoredRow) -> Result<(), TableError> {
        let previous = self
            .raw_replace(id, key, row)
            .ok_or(TableError::RowNotFound {
                table: id.table,
                scope: id.scope,
                key,
            })?;
        self.journal(UndoOp::Modified {
            table: id,
            key,
            previous,
        });
        Ok(())
    }

    fn delete(&mut self, id: TableId, key: u64) -> Result<(), TableError> {
        let previous = self.raw_remove(id, key).ok_or(TableError::RowNotFound {
            table: id.table,
            scope: id.scope,
            key,
        })?;
        self.journal(UndoOp::Removed {
            table: id,
            key,
            previous,
        });
        Ok(())
    }

    fn journal(&mut self, op: UndoOp) {
        if let Some(ops) = self.session.as_mut() {
            ops.push(op);
        }
    }

    // =========================================================================
    // RAW LAYER (no journal)
    // =========================================================================

    fn raw_get(&self, id: TableId, key: u64) -> Option<&StoredRow> {
        self.tables.get(&id).and_then(|t| t.rows.get(&key))
    }

    fn raw_insert(&mut self, id: TableId, key: u64, row: StoredRow) {
        let table = self.tables.entry(id).or_default();
        if let Some(secondary) = row.secondary {
            table.by_secondary.insert((secondary, key));
        }
        charge(&mut self.ram_usage, row.payer, row.billable_size());
        table.rows.insert(key, row);
    }

    /// Replaces an existing row. Leaves the table untouched and returns
    /// `None` if there is no row under `key`.
    fn raw_replace(&mut self, id: TableId, key: u64, row: StoredRow) -> Option<StoredRow> {
        let table = self.tables.get_mut(&id)?;
        let slot = table.rows.get_mut(&key)?;
        let previous = std::mem::replace(slot, row);

        if let Some(secondary) = previous.secondary {
            table.by_secondary.remove(&(secondary, key));
        }
        if let Some(secondary) = slot.secondary {
            table.by_secondary.insert((secondary, key));
        }
        charge(&mut self.ram_usage, previous.payer, -previous.billable_size());
        charge(&mut self.ram_usage, slot.payer, slot.billable_size());
        Some(previous)
    }

    fn raw_remove(&mut self, id: TableId, key: u64) -> Option<StoredRow> {
        let table = self.tables.get_mut(&id)?;
        let previous = table.rows.remove(&key)?;
        if let Some(secondary) = previous.secondary {
            table.by_secondary.remove(&(secondary, key));
        }
        if table.rows.is_empty() {
            self.tables.remove(&id);
        }
        charge(&mut self.ram_usage, previous.payer, -previous.billable_size());
        Some(previous)
    }
}

// =============================================================================
// UNDO SESSION GUARD
// =============================================================================

/// Open undo session over a database.
///
/// Dereferences to the database. Dropping the guard without calling
/// [`UndoSession::commit`] reverts every journalled mutation.
#[must_use = "dropping the session undoes it"]
pub struct UndoSession<'db> {
    db: &'db mut ChainDatabase,
}

impl UndoSession<'_> {
    /// Keep the journalled mutations. Returns how many there were.
    pub fn commit(self) -> usize {
        let mut this = std::mem::ManuallyDrop::new(self);
        this.db.commit()
    }

    /// Revert the journalled mutations. Returns how many were reverted.
    pub fn undo(self) -> usize {
        let mut this = std::mem::ManuallyDrop::new(self);
        this.db.undo()
    }
}

impl Deref for UndoSession<'_> {
    type Target = ChainDatabase;

    fn deref(&self) -> &ChainDatabase {
        self.db
    }
}

impl DerefMut for UndoSession<'_> {
    fn deref_mut(&mut self) -> &mut ChainDatabase {
        self.db
    }
}

impl Drop for UndoSession<'_> {
    fn drop(&mut self) {
        self.db.undo();
    }
}

// =============================================================================
// TYPED VIEWS
// =============================================================================

fn encode<T: TableRow>(row: &T, payer: Name) -> Result<StoredRow, TableError> {
    Ok(StoredRow {
        payer,
        secondary: row.secondary_key(),
        data: bincode::serialize(row).map_err(|e| TableError::Encode(e.to_string()))?,
    })
}

fn decode<T: TableRow>(row: &StoredRow) -> Result<T, TableError> {
    bincode::deserialize(&row.data).map_err(|e| TableError::Decode(e.to_string()))
}

/// Read-only view of one table.
pub struct TableView<'db, T> {
    db: &'db ChainDatabase,
    id: TableId,
    _row: PhantomData<fn() -> T>,
}

impl<'db, T: TableRow> TableView<'db, T> {
    fn data(&self) -> Option<&'db TableData> {
        self.db.tables.get(&self.id)
    }

    fn decode_keys(&self, keys: impl Iterator<Item = u64>) -> Result<Vec<T>, TableError> {
        let Some(data) = self.data() else {
            return Ok(Vec::new());
        };
        keys.filter_map(|key| data.rows.get(&key))
            .map(decode::<T>)
            .collect()
    }

    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Row under `key`, if any.
    pub fn find(&self, key: u64) -> Result<Option<T>, TableError> {
        self.db.raw_get(self.id, key).map(decode::<T>).transpose()
    }

    /// Row under `key`; `RowNotFound` if absent.
    pub fn get(&self, key: u64) -> Result<T, TableError> {
        self.find(key)?.ok_or(TableError::RowNotFound {
            table: self.id.table,
            scope: self.id.scope,
            key,
        })
    }

    #[must_use]
    pub fn contains(&self, key: u64) -> bool {
        self.db.raw_get(self.id, key).is_some()
    }

    /// Account billed for the row under `key`.
    #[must_use]
    pub fn payer(&self, key: u64) -> Option<Name> {
        self.db.raw_get(self.id, key).map(|row| row.payer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data().map_or(0, |t| t.rows.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All rows in primary key order.
    pub fn iter(&self) -> Result<Vec<T>, TableError> {
        self.data()
            .map_or_else(|| Ok(Vec::new()), |t| t.rows.values().map(decode::<T>).collect())
    }

    /// All indexed rows ordered by `(secondary, primary)`.
    pub fn by_secondary(&self) -> Result<Vec<T>, TableError> {
        let keys: Vec<u64> = self
            .data()
            .map(|t| t.by_secondary.iter().map(|&(_, key)| key).collect())
            .unwrap_or_default();
        self.decode_keys(keys.into_iter())
    }

    /// Indexed rows whose secondary key lies in `range`, in index order.
    pub fn secondary_range(&self, range: RangeInclusive<u64>) -> Result<Vec<T>, TableError> {
        let (lo, hi) = range.into_inner();
        if lo > hi {
            return Ok(Vec::new());
        }
        let keys: Vec<u64> = self
            .data()
            .map(|t| {
                t.by_secondary
                    .range((lo, u64::MIN)..=(hi, u64::MAX))
                    .map(|&(_, key)| key)
                    .collect()
            })
            .unwrap_or_default();
        self.decode_keys(keys.into_iter())
    }

    /// First indexed row whose secondary key is `>= value`.
    pub fn lower_bound_secondary(&self, value: u64) -> Result<Option<T>, TableError> {
        let key = self
            .data()
            .and_then(|t| t.by_secondary.range((value, u64::MIN)..).next())
            .map(|&(_, key)| key);
        match key {
            Some(key) => self.find(key),
            None => Ok(None),
        }
    }
}

/// Mutable view of one table.
pub struct MultiIndex<'db, T> {
    db: &'db mut ChainDatabase,
    id: TableId,
    _row: PhantomData<fn() -> T>,
}

impl<T: TableRow> MultiIndex<'_, T> {
    /// Read-only view over the same table.
    #[must_use]
    pub fn view(&self) -> TableView<'_, T> {
        TableView {
            db: self.db,
            id: self.id,
            _row: PhantomData,
        }
    }

    pub fn find(&self, key: u64) -> Result<Option<T>, TableError> {
        self.view().find(key)
    }

    pub fn get(&self, key: u64) -> Result<T, TableError> {
        self.view().get(key)
    }

    #[must_use]
    pub fn contains(&self, key: u64) -> bool {
        self.view().contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.view().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    /// Insert a new row billed to `payer`. Fails if the primary key exists.
    pub fn emplace(&mut self, payer: Name, row: &T) -> Result<(), TableError> {
        let stored = encode(row, payer)?;
        self.db.store(self.id, row.primary_key(), stored)
    }

    /// Apply `update` to the row under `key` and bill it to `payer`.
    ///
    /// The secondary index follows the updated row. Changing the primary key
    /// inside `update` is rejected and leaves the row as it was.
    pub fn modify(
        &mut self,
        key: u64,
        payer: Name,
        update: impl FnOnce(&mut T),
    ) -> Result<T, TableError> {
        let mut row = self.get(key)?;
        update(&mut row);
        if row.primary_key() != key {
            return Err(TableError::PrimaryKeyChanged {
                before: key,
                after: row.primary_key(),
            });
        }
        let stored = encode(&row, payer)?;
        self.db.update(self.id, key, stored)?;
        Ok(row)
    }

    /// Remove the row under `key`, returning it.
    pub fn erase(&mut self, key: u64) -> Result<T, TableError> {
        let row = self.get(key)?;
        self.db.delete(self.id, key)?;
        Ok(row)
    }
}

// =============================================================================
// TESTS
// =============================================================================
