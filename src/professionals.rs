//! Professional request payloads.

use serde::Deserialize;

use crate::models::{NewProfessional, Professional, LICENSE_NUMBER_MODULUS};
use crate::validation::{self, Problems, ValidationError};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 80;
pub const SPECIALTY_MAX_CHARS: usize = 50;
pub const SERVICE_MODE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalRequest {
    #[serde(rename = "nome_profissional", default)]
    pub name: Option<String>,
    #[serde(rename = "especialidade_profissional", default)]
    pub specialty: Option<String>,
    #[serde(rename = "tipo_atend", default)]
    pub service_mode: Option<String>,
    #[serde(rename = "crm_profissional", default)]
    pub license_number: Option<i64>,
}

impl ProfessionalRequest {
    pub fn clean(&mut self) {
        validation::clean(&mut self.name);
        validation::clean(&mut self.specialty);
        validation::clean(&mut self.service_mode);
    }

    pub fn into_new(mut self) -> Result<NewProfessional, ValidationError> {
        self.clean();
        let mut problems = Problems::new();

        validation::check_text(
            &mut problems,
            "Professional name",
            self.name.as_deref(),
            NAME_MIN_CHARS,
            NAME_MAX_CHARS,
        );
        validation::check_text(
            &mut problems,
            "Specialty",
            self.specialty.as_deref(),
            1,
            SPECIALTY_MAX_CHARS,
        );
        validation::check_text(
            &mut problems,
            "Service mode",
            self.service_mode.as_deref(),
            1,
            SERVICE_MODE_MAX_CHARS,
        );
        match self.license_number {
            None => problems.push("License number is required"),
            Some(n) => check_license_number(&mut problems, n),
        }
        problems.finish()?;

        match (self.name, self.specialty, self.service_mode, self.license_number) {
            (Some(name), Some(specialty), Some(service_mode), Some(license_number)) => {
                Ok(NewProfessional {
                    name,
                    specialty,
                    service_mode,
                    license_number,
                })
            }
            _ => Err(ValidationError::single("Incomplete professional data")),
        }
    }

    pub fn merge_into(
        mut self,
        existing: &Professional,
    ) -> Result<NewProfessional, ValidationError> {
        self.clean();
        let mut problems = Problems::new();

        if let Some(name) = self.name.as_deref() {
            validation::check_length(
                &mut problems,
                "Professional name",
                name,
                NAME_MIN_CHARS,
                NAME_MAX_CHARS,
            );
        }
        if let Some(specialty) = self.specialty.as_deref() {
            validation::check_length(
                &mut problems,
                "Specialty",
                specialty,
                1,
                SPECIALTY_MAX_CHARS,
            );
        }
        if let Some(mode) = self.service_mode.as_deref() {
            validation::check_length(
                &mut problems,
                "Service mode",
                mode,
                1,
                SERVICE_MODE_MAX_CHARS,
            );
        }
        if let Some(n) = self.license_number {
            check_license_number(&mut problems, n);
        }
        problems.finish()?;

        Ok(NewProfessional {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            specialty: self.specialty.unwrap_or_else(|| existing.specialty.clone()),
            service_mode: self
                .service_mode
                .unwrap_or_else(|| existing.service_mode.clone()),
            license_number: self.license_number.unwrap_or(existing.license_number),
        })
    }
}

fn check_license_number(problems: &mut Problems, n: i64) {
    problems.check(
        (1..LICENSE_NUMBER_MODULUS).contains(&n),
        format!("License number must be between 1 and {}", LICENSE_NUMBER_MODULUS - 1),
    );
}

/// A license number taken from a path segment must be positive.
pub fn parse_license_number(raw: i64) -> Result<i64, ValidationError> {
    if raw > 0 {
        Ok(raw)
    } else {
        Err(ValidationError::single("License number must be a positive number"))
    }
}
