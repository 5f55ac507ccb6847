use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::ids::ProfessionalId;

/// License numbers are stored modulo this value on creation.
pub const LICENSE_NUMBER_MODULUS: i64 = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    #[serde(rename = "id_profissional")]
    pub id: ProfessionalId,
    #[serde(rename = "nome_profissional")]
    pub name: String,
    #[serde(rename = "especialidade_profissional")]
    pub specialty: String,
    #[serde(rename = "tipo_atend")]
    pub service_mode: String,
    #[serde(rename = "crm_profissional")]
    pub license_number: i64,
}

// Identity is the record id, not the field values.
impl PartialEq for Professional {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Professional {}

impl Hash for Professional {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A professional that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfessional {
    pub name: String,
    pub specialty: String,
    pub service_mode: String,
    pub license_number: i64,
}

/// Lossy normalization applied to license numbers at creation time.
///
/// Values above six digits keep only their last six. Updates store the
/// number as given.
pub fn normalize_license_number(raw: i64) -> i64 {
    raw % LICENSE_NUMBER_MODULUS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prof(id: i64, name: &str) -> Professional {
        Professional {
            id: ProfessionalId::new(id).unwrap(),
            name: name.into(),
            specialty: "Cardiologia".into(),
            service_mode: "presencial".into(),
            license_number: 123456,
        }
    }

    #[test]
    fn equality_ignores_fields_other_than_id() {
        assert_eq!(prof(7, "Ana"), prof(7, "Bruno"));
        assert_ne!(prof(7, "Ana"), prof(8, "Ana"));
    }

    #[test]
    fn license_numbers_keep_last_six_digits() {
        assert_eq!(normalize_license_number(123456), 123456);
        assert_eq!(normalize_license_number(1_234_567), 234_567);
        assert_eq!(normalize_license_number(5_000_000), 0);
    }

    #[test]
    fn serializes_with_portuguese_field_names() {
        let json = serde_json::to_value(prof(7, "Ana")).unwrap();
        assert_eq!(json["id_profissional"], 7);
        assert_eq!(json["nome_profissional"], "Ana");
        assert_eq!(json["crm_profissional"], 123456);
    }
}
