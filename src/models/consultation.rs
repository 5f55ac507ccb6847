use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{ConsultationId, ProfessionalId};
use super::professional::Professional;

/// A stored consultation with its linked professionals hydrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(rename = "id_consulta")]
    pub id: ConsultationId,
    #[serde(rename = "tipo_consulta")]
    pub kind: String,
    #[serde(rename = "data_consulta")]
    pub date: NaiveDate,
    #[serde(rename = "motivo_consulta")]
    pub reason: String,
    #[serde(rename = "profissionais")]
    pub professionals: Vec<Professional>,
}

impl Consultation {
    pub fn professional_ids(&self) -> Vec<ProfessionalId> {
        self.professionals.iter().map(|p| p.id).collect()
    }
}

/// Mutable consultation fields plus the full set of professionals to link.
///
/// Used both for creation and for full-replace updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultationDraft {
    pub kind: String,
    pub date: NaiveDate,
    pub reason: String,
    pub professional_ids: Vec<ProfessionalId>,
}

impl ConsultationDraft {
    /// Professional ids with repeats removed, first occurrence wins.
    pub fn distinct_professional_ids(&self) -> Vec<ProfessionalId> {
        let mut seen = Vec::with_capacity(self.professional_ids.len());
        for id in &self.professional_ids {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}
