use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use super::allocator::{next_id, EntityKind};
use crate::db::{is_foreign_key_violation, map_write_error, DatabaseError};
use crate::models::*;

const SELECT_PATIENT: &str =
    "SELECT id, name, age, tech_level, service_mode, cpf, password_digest FROM patients";

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        tech_level: row.get(3)?,
        service_mode: row.get(4)?,
        cpf: row.get(5)?,
        password_digest: row.get(6)?,
    })
}

/// Insert a patient under the next sequential id.
pub fn create_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let id = PatientId::new(next_id(&tx, EntityKind::Patient)?)?;
    tx.execute(
        "INSERT INTO patients (id, name, age, tech_level, service_mode, cpf, password_digest)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            new.name,
            new.age,
            new.tech_level,
            new.service_mode,
            new.cpf,
            new.password_digest
        ],
    )
    .map_err(|e| map_write_error(e, "patient insert"))?;
    tx.commit()?;

    tracing::info!(patient_id = %id, "Patient created");
    Ok(Patient {
        id,
        name: new.name.clone(),
        age: new.age,
        tech_level: new.tech_level,
        service_mode: new.service_mode.clone(),
        cpf: new.cpf.clone(),
        password_digest: new.password_digest.clone(),
    })
}

pub fn get_patient(conn: &Connection, id: PatientId) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("{SELECT_PATIENT} WHERE id = ?1"),
            params![id],
            row_to_patient,
        )
        .optional()?;
    Ok(patient)
}

/// Look a patient up by CPF (digits only, as stored).
pub fn find_patient_by_cpf(conn: &Connection, cpf: &str) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("{SELECT_PATIENT} WHERE cpf = ?1"),
            params![cpf],
            row_to_patient,
        )
        .optional()?;
    Ok(patient)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_PATIENT} ORDER BY name, id"))?;
    let rows = stmt.query_map([], row_to_patient)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Overwrite every stored field of an existing patient.
pub fn update_patient(
    conn: &Connection,
    id: PatientId,
    fields: &NewPatient,
) -> Result<Patient, DatabaseError> {
    update_patient_with(conn, id, |_| Ok::<_, DatabaseError>(fields.clone()))
}

/// Read the stored patient, derive the new fields from it with `merge` and
/// write them, all under one IMMEDIATE transaction. An error from `merge`
/// leaves the row untouched.
pub fn update_patient_with<E, F>(conn: &Connection, id: PatientId, merge: F) -> Result<Patient, E>
where
    F: FnOnce(&Patient) -> Result<NewPatient, E>,
    E: From<DatabaseError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;
    let existing =
        get_patient(&tx, id)?.ok_or_else(|| DatabaseError::not_found(PatientId::ENTITY, id))?;
    let fields = merge(&existing)?;

    tx.execute(
        "UPDATE patients
         SET name = ?2, age = ?3, tech_level = ?4, service_mode = ?5, cpf = ?6,
             password_digest = ?7
         WHERE id = ?1",
        params![
            id,
            fields.name,
            fields.age,
            fields.tech_level,
            fields.service_mode,
            fields.cpf,
            fields.password_digest
        ],
    )
    .map_err(|e| map_write_error(e, "patient update"))?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(patient_id = %id, "Patient updated");
    Ok(Patient {
        id,
        name: fields.name,
        age: fields.age,
        tech_level: fields.tech_level,
        service_mode: fields.service_mode,
        cpf: fields.cpf,
        password_digest: fields.password_digest,
    })
}

pub fn delete_patient(conn: &Connection, id: PatientId) -> Result<(), DatabaseError> {
    let removed = conn
        .execute("DELETE FROM patients WHERE id = ?1", params![id])
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DatabaseError::Conflict {
                    entity_type: PatientId::ENTITY.into(),
                    id: id.to_string(),
                    reason: "still referenced by another record".into(),
                }
            } else {
                DatabaseError::Sqlite(e)
            }
        })?;
    if removed == 0 {
        return Err(DatabaseError::not_found(PatientId::ENTITY, id));
    }
    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(())
}
