//! Consultation request payloads: cleaning, validation and merging onto a
//! stored consultation for partial updates.

use serde::Deserialize;

use crate::models::{Consultation, ConsultationDraft, ProfessionalId};
use crate::validation::{self, Problems, ValidationError};

pub const KIND_MAX_CHARS: usize = 100;
pub const REASON_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationRequest {
    #[serde(rename = "tipo_consulta", default)]
    pub kind: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(rename = "data_consulta", default)]
    pub date: Option<String>,
    #[serde(rename = "motivo_consulta", default)]
    pub reason: Option<String>,
    /// Absent keeps the current set on update; present replaces it.
    #[serde(rename = "ids_profissionais", default)]
    pub professional_ids: Option<Vec<i64>>,
}

impl ConsultationRequest {
    pub fn clean(&mut self) {
        validation::clean(&mut self.kind);
        validation::clean(&mut self.date);
        validation::clean(&mut self.reason);
    }

    /// Build a draft for a new consultation. Kind, date and reason are required.
    pub fn into_draft(mut self) -> Result<ConsultationDraft, ValidationError> {
        self.clean();
        let mut problems = Problems::new();

        validation::check_text(
            &mut problems,
            "Consultation kind",
            self.kind.as_deref(),
            1,
            KIND_MAX_CHARS,
        );
        validation::check_text(
            &mut problems,
            "Consultation reason",
            self.reason.as_deref(),
            1,
            REASON_MAX_CHARS,
        );
        let date = match self.date.as_deref() {
            None => {
                problems.push("Consultation date is required");
                None
            }
            Some(raw) => parse_date(&mut problems, raw),
        };
        let professional_ids = professional_ids(
            &mut problems,
            self.professional_ids.as_deref().unwrap_or_default(),
        );
        problems.finish()?;

        match (self.kind, date, self.reason) {
            (Some(kind), Some(date), Some(reason)) => Ok(ConsultationDraft {
                kind,
                date,
                reason,
                professional_ids,
            }),
            _ => Err(ValidationError::single(
                "Consultation kind, date and reason are required",
            )),
        }
    }

    /// Apply the fields that are present onto `existing`.
    pub fn merge_into(
        mut self,
        existing: &Consultation,
    ) -> Result<ConsultationDraft, ValidationError> {
        self.clean();
        let mut problems = Problems::new();

        if let Some(kind) = self.kind.as_deref() {
            validation::check_length(&mut problems, "Consultation kind", kind, 1, KIND_MAX_CHARS);
        }
        if let Some(reason) = self.reason.as_deref() {
            validation::check_length(
                &mut problems,
                "Consultation reason",
                reason,
                1,
                REASON_MAX_CHARS,
            );
        }
        let date = match self.date.as_deref() {
            Some(raw) => parse_date(&mut problems, raw),
            None => Some(existing.date),
        };
        let professional_ids = match self.professional_ids.as_deref() {
            Some(ids) => professional_ids(&mut problems, ids),
            None => existing.professional_ids(),
        };
        problems.finish()?;

        Ok(ConsultationDraft {
            kind: self.kind.unwrap_or_else(|| existing.kind.clone()),
            date: date.unwrap_or(existing.date),
            reason: self.reason.unwrap_or_else(|| existing.reason.clone()),
            professional_ids,
        })
    }
}

fn parse_date(problems: &mut Problems, raw: &str) -> Option<chrono::NaiveDate> {
    let parsed = validation::parse_date(raw);
    if parsed.is_none() {
        problems.push("Invalid consultation date format (expected YYYY-MM-DD)");
    }
    parsed
}

fn professional_ids(problems: &mut Problems, raw: &[i64]) -> Vec<ProfessionalId> {
    raw.iter()
        .filter_map(|&id| match ProfessionalId::new(id) {
            Ok(id) => Some(id),
            Err(e) => {
                problems.push(e.to_string());
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(json: serde_json::Value) -> ConsultationRequest {
        serde_json::from_value(json).unwrap()
    }

    fn stored() -> Consultation {
        Consultation {
            id: crate::models::ConsultationId::new(1).unwrap(),
            kind: "Consulta Geral".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            reason: "checkup".into(),
            professionals: vec![crate::models::Professional {
                id: ProfessionalId::new(7).unwrap(),
                name: "Dra. Ana".into(),
                specialty: "Cardiologia".into(),
                service_mode: "presencial".into(),
                license_number: 12345,
            }],
        }
    }

    #[test]
    fn create_trims_and_parses() {
        let draft = request(serde_json::json!({
            "tipo_consulta": "  Retorno ",
            "data_consulta": "2024-05-10",
            "motivo_consulta": " dor de cabeça ",
            "ids_profissionais": [3, 3, 9]
        }))
        .into_draft()
        .unwrap();
        assert_eq!(draft.kind, "Retorno");
        assert_eq!(draft.reason, "dor de cabeça");
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(draft.distinct_professional_ids().len(), 2);
    }

    #[test]
    fn create_without_professionals_is_allowed() {
        let draft = request(serde_json::json!({
            "tipo_consulta": "Retorno",
            "data_consulta": "2024-05-10",
            "motivo_consulta": "dor"
        }))
        .into_draft()
        .unwrap();
        assert!(draft.professional_ids.is_empty());
    }

    #[test]
    fn create_reports_every_problem() {
        let err = request(serde_json::json!({
            "tipo_consulta": "   ",
            "data_consulta": "10/05/2024",
            "ids_profissionais": [0, -2]
        }))
        .into_draft()
        .unwrap_err();
        // kind, reason, date, two bad ids
        assert_eq!(err.problems.len(), 5);
    }

    #[test]
    fn merge_keeps_absent_fields_and_links() {
        let draft = request(serde_json::json!({ "motivo_consulta": "retorno" }))
            .merge_into(&stored())
            .unwrap();
        assert_eq!(draft.kind, "Consulta Geral");
        assert_eq!(draft.reason, "retorno");
        assert_eq!(draft.professional_ids, vec![ProfessionalId::new(7).unwrap()]);
    }

    #[test]
    fn merge_with_empty_list_clears_links() {
        let draft = request(serde_json::json!({ "ids_profissionais": [] }))
            .merge_into(&stored())
            .unwrap();
        assert!(draft.professional_ids.is_empty());
    }

    #[test]
    fn merge_rejects_bad_date() {
        let err = request(serde_json::json!({ "data_consulta": "2024-13-01" }))
            .merge_into(&stored())
            .unwrap_err();
        assert_eq!(err.problems.len(), 1);
    }
}
