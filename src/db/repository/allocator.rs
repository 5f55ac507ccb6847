//! Primary-key allocation for new rows.
//!
//! Two policies coexist. Patients and consultations take `max(id) + 1`;
//! professionals draw a uniform id from a small fixed range without
//! checking for collisions (the primary key rejects a clash at insert time).
//!
//! Sequential allocation must run on the same transaction as the insert it
//! feeds, opened with `TransactionBehavior::Immediate`, so no other writer
//! can observe the same maximum in between.

use rand::Rng;
use rusqlite::Connection;

use crate::db::DatabaseError;

/// Bounds of the random-sparse professional id range (inclusive).
pub const RANDOM_SPARSE_MIN: i64 = 1;
pub const RANDOM_SPARSE_MAX: i64 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Patient,
    Professional,
    Consultation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdAllocator {
    /// `max(column) + 1` over the table, `1` when empty.
    Sequential {
        table: &'static str,
        column: &'static str,
    },
    /// Uniform draw in `[min, max]`, no existence check.
    RandomSparse { min: i64, max: i64 },
}

impl EntityKind {
    pub fn allocator(self) -> IdAllocator {
        match self {
            Self::Patient => IdAllocator::Sequential {
                table: "patients",
                column: "id",
            },
            Self::Consultation => IdAllocator::Sequential {
                table: "consultations",
                column: "id",
            },
            Self::Professional => IdAllocator::RandomSparse {
                min: RANDOM_SPARSE_MIN,
                max: RANDOM_SPARSE_MAX,
            },
        }
    }
}

impl IdAllocator {
    pub fn next_id(&self, conn: &Connection) -> Result<i64, DatabaseError> {
        self.next_id_with(conn, &mut rand::thread_rng())
    }

    /// Same as [`IdAllocator::next_id`] with a caller-supplied RNG.
    pub fn next_id_with<R: Rng>(
        &self,
        conn: &Connection,
        rng: &mut R,
    ) -> Result<i64, DatabaseError> {
        match *self {
            Self::Sequential { table, column } => {
                // Identifiers are static, never user input.
                let sql = format!("SELECT COALESCE(MAX({column}), 0) + 1 FROM {table}");
                let next = conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?;
                Ok(next)
            }
            Self::RandomSparse { min, max } => Ok(rng.gen_range(min..=max)),
        }
    }
}

/// Allocate the next id for `kind`. Read failures are returned, never
/// papered over with a default.
pub fn next_id(conn: &Connection, kind: EntityKind) -> Result<i64, DatabaseError> {
    let id = kind.allocator().next_id(conn)?;
    tracing::debug!(?kind, id, "Allocated record id");
    Ok(id)
}
