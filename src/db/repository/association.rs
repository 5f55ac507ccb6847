//! Consultation ↔ professional links.
//!
//! A link is a `(consultation_id, professional_id)` pair. The pair is the
//! primary key of the join table, so linking twice is a no-op. Both sides are
//! foreign keys: linking to a row that does not exist fails with `NotFound`
//! naming the missing side, and nothing is written.

use rusqlite::{params, Connection, OptionalExtension};

use super::professional::row_to_professional;
use crate::db::{is_foreign_key_violation, DatabaseError};
use crate::models::*;

/// Link a professional to a consultation.
///
/// Returns `true` when a new link was written, `false` when it already existed.
pub fn link_professional(
    conn: &Connection,
    consultation_id: ConsultationId,
    professional_id: ProfessionalId,
) -> Result<bool, DatabaseError> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO consultation_professionals (consultation_id, professional_id)
             VALUES (?1, ?2)",
            params![consultation_id, professional_id],
        )
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_side(conn, consultation_id, professional_id)
            } else {
                DatabaseError::Sqlite(e)
            }
        })?;
    Ok(inserted > 0)
}

/// Work out which end of a rejected link is missing.
fn missing_side(
    conn: &Connection,
    consultation_id: ConsultationId,
    professional_id: ProfessionalId,
) -> DatabaseError {
    let professional_exists = conn
        .query_row(
            "SELECT 1 FROM professionals WHERE id = ?1",
            params![professional_id],
            |_| Ok(()),
        )
        .optional();
    match professional_exists {
        Ok(Some(())) => DatabaseError::not_found(ConsultationId::ENTITY, consultation_id),
        Ok(None) => DatabaseError::not_found(ProfessionalId::ENTITY, professional_id),
        Err(e) => DatabaseError::Sqlite(e),
    }
}

/// Remove every link of a consultation. Returns how many were removed.
pub fn unlink_all_professionals(
    conn: &Connection,
    consultation_id: ConsultationId,
) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM consultation_professionals WHERE consultation_id = ?1",
        params![consultation_id],
    )?;
    Ok(removed)
}

/// Professionals linked to a consultation, in link order.
///
/// An unknown consultation yields an empty list; callers that need to tell
/// the two apart check the consultation row first.
pub fn professionals_for(
    conn: &Connection,
    consultation_id: ConsultationId,
) -> Result<Vec<Professional>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.specialty, p.service_mode, p.license_number
         FROM consultation_professionals cp
         JOIN professionals p ON p.id = cp.professional_id
         WHERE cp.consultation_id = ?1
         ORDER BY cp.rowid",
    )?;
    let rows = stmt.query_map(params![consultation_id], row_to_professional)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Number of consultations a professional is linked to.
pub fn count_links_for_professional(
    conn: &Connection,
    professional_id: ProfessionalId,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM consultation_professionals WHERE professional_id = ?1",
        params![professional_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
