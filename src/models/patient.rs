use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::ids::PatientId;

#[derive(Clone, Serialize)]
pub struct Patient {
    #[serde(rename = "id_paciente")]
    pub id: PatientId,
    #[serde(rename = "nome_paciente")]
    pub name: String,
    #[serde(rename = "idade_paciente")]
    pub age: u8,
    #[serde(rename = "nivel_tecnico")]
    pub tech_level: u8,
    #[serde(rename = "tipo_atendimento")]
    pub service_mode: String,
    #[serde(rename = "cpf_paciente")]
    pub cpf: String,
    /// PBKDF2 digest of the patient's password. Never serialized.
    #[serde(skip)]
    pub password_digest: String,
}

impl std::fmt::Debug for Patient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patient")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("age", &self.age)
            .field("tech_level", &self.tech_level)
            .field("service_mode", &self.service_mode)
            .field("cpf", &self.cpf)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Patient {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Patient {}

impl Hash for Patient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A patient that has not been stored yet. The password is already hashed.
#[derive(Clone)]
pub struct NewPatient {
    pub name: String,
    pub age: u8,
    pub tech_level: u8,
    pub service_mode: String,
    pub cpf: String,
    pub password_digest: String,
}

impl std::fmt::Debug for NewPatient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPatient")
            .field("name", &self.name)
            .field("age", &self.age)
            .field("tech_level", &self.tech_level)
            .field("service_mode", &self.service_mode)
            .field("cpf", &self.cpf)
            .finish_non_exhaustive()
    }
}
