//! Consultation rows and their professional links, kept consistent.
//!
//! Every operation here touches more than one statement, so each runs in a
//! single transaction: writes open it `IMMEDIATE` (allocation, insert and
//! links commit together or not at all), reads open a deferred one so the
//! row and its links come from the same snapshot.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::allocator::{next_id, EntityKind};
use super::association::{link_professional, professionals_for, unlink_all_professionals};
use crate::db::{is_foreign_key_violation, DatabaseError};
use crate::models::*;

struct ConsultationRow {
    id: ConsultationId,
    kind: String,
    date: NaiveDate,
    reason: String,
}

fn get_row(
    conn: &Connection,
    id: ConsultationId,
) -> Result<Option<ConsultationRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, kind, date, reason FROM consultations WHERE id = ?1",
            params![id],
            |row| {
                Ok(ConsultationRow {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                    date: row.get(2)?,
                    reason: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

fn hydrate(conn: &Connection, row: ConsultationRow) -> Result<Consultation, DatabaseError> {
    let professionals = professionals_for(conn, row.id)?;
    Ok(Consultation {
        id: row.id,
        kind: row.kind,
        date: row.date,
        reason: row.reason,
        professionals,
    })
}

fn load(conn: &Connection, id: ConsultationId) -> Result<Option<Consultation>, DatabaseError> {
    match get_row(conn, id)? {
        Some(row) => hydrate(conn, row).map(Some),
        None => Ok(None),
    }
}

fn link_all(
    conn: &Connection,
    id: ConsultationId,
    draft: &ConsultationDraft,
) -> Result<(), DatabaseError> {
    for professional_id in draft.distinct_professional_ids() {
        link_professional(conn, id, professional_id)?;
    }
    Ok(())
}

/// Store a new consultation under the next sequential id and link its
/// professionals. Nothing is written if any professional does not exist.
pub fn create_consultation(
    conn: &Connection,
    draft: &ConsultationDraft,
) -> Result<Consultation, DatabaseError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let id = ConsultationId::new(next_id(&tx, EntityKind::Consultation)?)?;
    tx.execute(
        "INSERT INTO consultations (id, kind, date, reason) VALUES (?1, ?2, ?3, ?4)",
        params![id, draft.kind, draft.date, draft.reason],
    )?;
    link_all(&tx, id, draft)?;

    let consultation = load(&tx, id)?
        .ok_or_else(|| DatabaseError::not_found(ConsultationId::ENTITY, id))?;
    tx.commit()?;

    tracing::info!(
        consultation_id = %id,
        professionals = consultation.professionals.len(),
        "Consultation created"
    );
    Ok(consultation)
}

/// Fetch a consultation with its professionals. `None` means no such row;
/// an existing consultation without links comes back with an empty list.
pub fn get_consultation(
    conn: &Connection,
    id: ConsultationId,
) -> Result<Option<Consultation>, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let consultation = load(&tx, id)?;
    tx.commit()?;
    Ok(consultation)
}

/// All consultations, newest first, each with its professionals.
pub fn list_consultations(conn: &Connection) -> Result<Vec<Consultation>, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let rows = {
        let mut stmt = tx.prepare(
            "SELECT id, kind, date, reason FROM consultations ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ConsultationRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                date: row.get(2)?,
                reason: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    let consultations = rows
        .into_iter()
        .map(|row| hydrate(&tx, row))
        .collect::<Result<Vec<_>, _>>()?;
    tx.commit()?;
    Ok(consultations)
}

/// Overwrite kind, date and reason, and replace the whole professional set.
///
/// Fails with `NotFound` when the consultation does not exist, and with
/// `NotFound` for the professional when a listed one is missing. Either way
/// the stored consultation is left untouched.
pub fn update_consultation(
    conn: &Connection,
    id: ConsultationId,
    draft: &ConsultationDraft,
) -> Result<Consultation, DatabaseError> {
    update_consultation_with(conn, id, |_| Ok::<_, DatabaseError>(draft.clone()))
}

/// Load the stored consultation, build the replacement draft from it with
/// `merge` and write it, inside one IMMEDIATE transaction. No other writer
/// can change the row or its links between the read and the write.
pub fn update_consultation_with<E, F>(
    conn: &Connection,
    id: ConsultationId,
    merge: F,
) -> Result<Consultation, E>
where
    F: FnOnce(&Consultation) -> Result<ConsultationDraft, E>,
    E: From<DatabaseError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;

    let existing =
        load(&tx, id)?.ok_or_else(|| DatabaseError::not_found(ConsultationId::ENTITY, id))?;
    let draft = merge(&existing)?;

    tx.execute(
        "UPDATE consultations SET kind = ?2, date = ?3, reason = ?4 WHERE id = ?1",
        params![id, draft.kind, draft.date, draft.reason],
    )
    .map_err(DatabaseError::from)?;
    let removed = unlink_all_professionals(&tx, id)?;
    link_all(&tx, id, &draft)?;

    let consultation = load(&tx, id)?
        .ok_or_else(|| DatabaseError::not_found(ConsultationId::ENTITY, id))?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        consultation_id = %id,
        unlinked = removed,
        linked = consultation.professionals.len(),
        "Consultation updated"
    );
    Ok(consultation)
}

/// Remove a consultation and its links.
///
/// Links are cleared first. Any other row still referencing the consultation
/// makes the delete fail with `Conflict`, and the links stay in place.
pub fn delete_consultation(conn: &Connection, id: ConsultationId) -> Result<(), DatabaseError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let unlinked = unlink_all_professionals(&tx, id)?;
    let removed = tx
        .execute("DELETE FROM consultations WHERE id = ?1", params![id])
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DatabaseError::Conflict {
                    entity_type: ConsultationId::ENTITY.into(),
                    id: id.to_string(),
                    reason: "still referenced by another record".into(),
                }
            } else {
                DatabaseError::Sqlite(e)
            }
        })?;
    if removed == 0 {
        return Err(DatabaseError::not_found(ConsultationId::ENTITY, id));
    }
    tx.commit()?;

    tracing::info!(consultation_id = %id, unlinked, "Consultation deleted");
    Ok(())
}
