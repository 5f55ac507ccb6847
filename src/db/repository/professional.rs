use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use super::allocator::{next_id, EntityKind};
use super::association::count_links_for_professional;
use crate::db::{
    is_foreign_key_violation, is_primary_key_violation, map_write_error, DatabaseError,
};
use crate::models::*;

/// Random ids are redrawn this many times on a primary-key clash.
const MAX_ID_ATTEMPTS: u32 = 8;

const SELECT_PROFESSIONAL: &str =
    "SELECT id, name, specialty, service_mode, license_number FROM professionals";

pub(crate) fn row_to_professional(row: &Row<'_>) -> rusqlite::Result<Professional> {
    Ok(Professional {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        service_mode: row.get(3)?,
        license_number: row.get(4)?,
    })
}

/// Insert a professional under a freshly drawn random id.
///
/// The license number is normalized to its last six digits first. A drawn id
/// that is already taken is redrawn a few times; a clash on the license
/// number comes back as `ConstraintViolation`.
pub fn create_professional(
    conn: &Connection,
    new: &NewProfessional,
) -> Result<Professional, DatabaseError> {
    let license_number = normalize_license_number(new.license_number);
    if license_number != new.license_number {
        tracing::warn!(
            given = new.license_number,
            stored = license_number,
            "License number truncated to six digits"
        );
    }

    let mut attempt = 0;
    let id = loop {
        attempt += 1;
        let id = ProfessionalId::new(next_id(conn, EntityKind::Professional)?)?;
        let result = conn.execute(
            "INSERT INTO professionals (id, name, specialty, service_mode, license_number)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, new.name, new.specialty, new.service_mode, license_number],
        );
        match result {
            Ok(_) => break id,
            Err(e) if is_primary_key_violation(&e) && attempt < MAX_ID_ATTEMPTS => {
                tracing::debug!(professional_id = %id, attempt, "Random id taken, drawing again");
            }
            Err(e) => return Err(map_write_error(e, "professional insert")),
        }
    };

    tracing::info!(professional_id = %id, "Professional created");
    Ok(Professional {
        id,
        name: new.name.clone(),
        specialty: new.specialty.clone(),
        service_mode: new.service_mode.clone(),
        license_number,
    })
}

pub fn get_professional(
    conn: &Connection,
    id: ProfessionalId,
) -> Result<Option<Professional>, DatabaseError> {
    let professional = conn
        .query_row(
            &format!("{SELECT_PROFESSIONAL} WHERE id = ?1"),
            params![id],
            row_to_professional,
        )
        .optional()?;
    Ok(professional)
}

pub fn find_professional_by_license(
    conn: &Connection,
    license_number: i64,
) -> Result<Option<Professional>, DatabaseError> {
    let professional = conn
        .query_row(
            &format!("{SELECT_PROFESSIONAL} WHERE license_number = ?1"),
            params![license_number],
            row_to_professional,
        )
        .optional()?;
    Ok(professional)
}

pub fn list_professionals(conn: &Connection) -> Result<Vec<Professional>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_PROFESSIONAL} ORDER BY name, id"))?;
    let rows = stmt.query_map([], row_to_professional)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Overwrite every mutable field. The license number is stored as given.
pub fn update_professional(
    conn: &Connection,
    id: ProfessionalId,
    fields: &NewProfessional,
) -> Result<Professional, DatabaseError> {
    update_professional_with(conn, id, |_| Ok::<_, DatabaseError>(fields.clone()))
}

/// Read the stored professional, derive the new fields from it with `merge`
/// and write them, all under one IMMEDIATE transaction. An error from
/// `merge` leaves the row untouched.
pub fn update_professional_with<E, F>(
    conn: &Connection,
    id: ProfessionalId,
    merge: F,
) -> Result<Professional, E>
where
    F: FnOnce(&Professional) -> Result<NewProfessional, E>,
    E: From<DatabaseError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;
    let existing = get_professional(&tx, id)?
        .ok_or_else(|| DatabaseError::not_found(ProfessionalId::ENTITY, id))?;
    let fields = merge(&existing)?;

    tx.execute(
        "UPDATE professionals
         SET name = ?2, specialty = ?3, service_mode = ?4, license_number = ?5
         WHERE id = ?1",
        params![
            id,
            fields.name,
            fields.specialty,
            fields.service_mode,
            fields.license_number
        ],
    )
    .map_err(|e| map_write_error(e, "professional update"))?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(professional_id = %id, "Professional updated");
    Ok(Professional {
        id,
        name: fields.name,
        specialty: fields.specialty,
        service_mode: fields.service_mode,
        license_number: fields.license_number,
    })
}

/// Delete a professional. Refused while any consultation still links to it.
pub fn delete_professional(conn: &Connection, id: ProfessionalId) -> Result<(), DatabaseError> {
    let removed = match conn.execute("DELETE FROM professionals WHERE id = ?1", params![id]) {
        Ok(n) => n,
        Err(e) if is_foreign_key_violation(&e) => {
            let links = count_links_for_professional(conn, id)?;
            return Err(DatabaseError::Conflict {
                entity_type: ProfessionalId::ENTITY.into(),
                id: id.to_string(),
                reason: format!("linked to {links} consultation(s)"),
            });
        }
        Err(e) => return Err(e.into()),
    };
    if removed == 0 {
        return Err(DatabaseError::not_found(ProfessionalId::ENTITY, id));
    }
    tracing::info!(professional_id = %id, "Professional deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::ErrorKind;

    fn new_prof(license_number: i64) -> NewProfessional {
        NewProfessional {
            name: "Dra. Ana Lima".into(),
            specialty: "Cardiologia".into(),
            service_mode: "presencial".into(),
            license_number,
        }
    }

    #[test]
    fn create_then_get() {
        let conn = open_memory_database().unwrap();
        let created = create_professional(&conn, &new_prof(123456)).unwrap();
        assert!((1..=9999).contains(&created.id.get()));

        let fetched = get_professional(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Dra. Ana Lima");
        assert_eq!(fetched.license_number, 123456);
    }

    #[test]
    fn create_truncates_long_license_numbers() {
        let conn = open_memory_database().unwrap();
        let created = create_professional(&conn, &new_prof(9_876_543)).unwrap();
        assert_eq!(created.license_number, 876_543);
        assert!(find_professional_by_license(&conn, 876_543).unwrap().is_some());
    }

    #[test]
    fn update_keeps_license_number_verbatim() {
        let conn = open_memory_database().unwrap();
        let created = create_professional(&conn, &new_prof(111111)).unwrap();
        let updated = update_professional(&conn, created.id, &new_prof(1_234_567)).unwrap();
        assert_eq!(updated.license_number, 1_234_567);
        let fetched = get_professional(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.license_number, 1_234_567);
    }

    #[test]
    fn duplicate_license_is_a_constraint_violation() {
        let conn = open_memory_database().unwrap();
        create_professional(&conn, &new_prof(222222)).unwrap();
        let err = create_professional(&conn, &new_prof(222222)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn update_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err =
            update_professional(&conn, ProfessionalId::new(4242).unwrap(), &new_prof(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn update_with_merges_from_stored_row() {
        let conn = open_memory_database().unwrap();
        let created = create_professional(&conn, &new_prof(333333)).unwrap();
        let updated = update_professional_with(&conn, created.id, |existing| {
            let mut fields = NewProfessional {
                name: existing.name.clone(),
                specialty: existing.specialty.clone(),
                service_mode: existing.service_mode.clone(),
                license_number: existing.license_number,
            };
            fields.specialty = "Pediatria".into();
            Ok::<_, DatabaseError>(fields)
        })
        .unwrap();
        assert_eq!(updated.specialty, "Pediatria");
        assert_eq!(updated.license_number, 333333);
    }

    #[test]
    fn update_with_failed_merge_writes_nothing() {
        let conn = open_memory_database().unwrap();
        let created = create_professional(&conn, &new_prof(444444)).unwrap();
        let err = update_professional_with(&conn, created.id, |_| {
            Err::<NewProfessional, _>(DatabaseError::ConstraintViolation("rejected".into()))
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let fetched = get_professional(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.specialty, "Cardiologia");
    }

    #[test]
    fn list_is_ordered_by_name() {
        let conn = open_memory_database().unwrap();
        let mut zed = new_prof(1);
        zed.name = "Zé".into();
        let mut bia = new_prof(2);
        bia.name = "Bia".into();
        create_professional(&conn, &zed).unwrap();
        create_professional(&conn, &bia).unwrap();
        let names: Vec<String> = list_professionals(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Bia", "Zé"]);
    }

    #[test]
    fn delete_unlinked_professional() {
        let conn = open_memory_database().unwrap();
        let created = create_professional(&conn, &new_prof(333333)).unwrap();
        delete_professional(&conn, created.id).unwrap();
        assert!(get_professional(&conn, created.id).unwrap().is_none());
        let again = delete_professional(&conn, created.id).unwrap_err();
        assert_eq!(again.kind(), ErrorKind::NotFound);
    }
}
