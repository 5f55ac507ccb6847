use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// Macro to generate a positive integer record id with SQL + serde plumbing.
///
/// A value of the generated type always refers to a stored (or storable) row:
/// zero and negative ids are rejected at construction, so "no id yet" is
/// modelled by the draft types instead of a sentinel.
macro_rules! record_id {
    ($name:ident => $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            pub const ENTITY: &'static str = $entity;

            pub fn new(value: i64) -> Result<Self, DatabaseError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(DatabaseError::InvalidId {
                        entity_type: $entity.into(),
                        value,
                    })
                }
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = DatabaseError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = i64::column_result(value)?;
                Self::new(raw).map_err(|_| FromSqlError::OutOfRange(raw))
            }
        }
    };
}

record_id!(PatientId => "Patient");
record_id!(ProfessionalId => "Professional");
record_id!(ConsultationId => "Consultation");
